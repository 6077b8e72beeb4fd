use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Listing {
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ListingData {
    #[serde(default, deserialize_with = "skip_bad_children")]
    pub children: Option<Vec<ListingChild>>,
}

/// Children that fail to parse on their own are dropped instead of failing the listing.
fn skip_bad_children<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<ListingChild>>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| ListingChild::deserialize(item).ok())
            .collect()
    }))
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ListingChild {
    #[serde(default)]
    pub data: Option<Post>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Post {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_overridden_by_dest: Option<String>,
    #[serde(default)]
    pub post_hint: Option<String>,
    #[serde(default)]
    pub preview: Option<Preview>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Preview {
    #[serde(default)]
    pub images: Option<Vec<PreviewImage>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PreviewImage {
    #[serde(default)]
    pub source: Option<PreviewSource>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PreviewSource {
    #[serde(default)]
    pub url: Option<String>,
}

impl Listing {
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.data
            .iter()
            .filter_map(|data| data.children.as_ref())
            .flatten()
            .filter_map(|child| child.data.as_ref())
    }
}

impl Post {
    pub fn preview_url(&self) -> Option<&str> {
        self.preview
            .as_ref()?
            .images
            .as_ref()?
            .first()?
            .source
            .as_ref()?
            .url
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;

    #[test]
    fn missing_fields_do_not_fail_parsing() {
        let listing: Listing = from_str(
            r#"{"data":{"children":[{"data":{}},{"kind":"t3"},{"data":{"score":12}}]}}"#,
        )
        .unwrap();
        assert_eq!(listing.posts().count(), 2);

        let empty: Listing = from_str("{}").unwrap();
        assert_eq!(empty.posts().count(), 0);
    }

    #[test]
    fn badly_typed_children_are_skipped() {
        let listing: Listing = from_str(
            r#"{"data":{"children":[
                {"data":{"url":"https://i.redd.it/good.png","score":80}},
                {"data":{"url":"https://i.redd.it/bad.png","score":"hidden"}},
                null,
                {"data":{"url":42}}
            ]}}"#,
        )
        .unwrap();
        let urls: Vec<_> = listing.posts().filter_map(|p| p.url.as_deref()).collect();
        assert_eq!(urls, vec!["https://i.redd.it/good.png"]);

        let odd: Listing = from_str(r#"{"data":{"children":"nope"}}"#).unwrap();
        assert_eq!(odd.posts().count(), 0);
    }

    #[test]
    fn preview_url_reads_first_source() {
        let listing: Listing = from_str(
            r#"{"data":{"children":[{"data":{"preview":{"images":[
                {"source":{"url":"https://preview.redd.it/a.jpg?x=1&amp;y=2"}},
                {"source":{"url":"https://preview.redd.it/b.jpg"}}
            ]}}}]}}"#,
        )
        .unwrap();
        let post = listing.posts().next().unwrap();
        assert_eq!(
            post.preview_url(),
            Some("https://preview.redd.it/a.jpg?x=1&amp;y=2")
        );
    }
}
