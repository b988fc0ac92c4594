use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

impl<F> TileSource for F
where
    F: Fn(TileCoord) -> String + Send + Sync,
{
    fn url(&self, coord: TileCoord) -> String {
        self(coord)
    }
}

/// URL template with `{z}`, `{x}` and `{y}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}
