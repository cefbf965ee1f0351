use serde::Deserialize;

use crate::caption::CaptionParams;

/// Query string of `GET /image`. Everything stays a string so malformed
/// numbers fall back to defaults instead of rejecting the request.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct ImageQuery {
    pub(crate) img: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) stat: Option<String>,
    pub(crate) size: Option<String>,
}

impl From<ImageQuery> for CaptionParams {
    fn from(query: ImageQuery) -> Self {
        CaptionParams {
            img: query.img,
            text: query.text,
            name: query.name,
            stat: query.stat,
            size: query.size,
        }
    }
}
