use crate::config::LayersConfig;
use crate::types::Layer;

/// Classifies paths and import specifiers into architectural layers by
/// matching whole path segments against per-layer keywords.
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    /// (layer, lower-cased keywords) in priority order.
    keywords: Vec<(Layer, Vec<String>)>,
}

impl LayerClassifier {
    pub fn new(config: &LayersConfig) -> Self {
        let keywords = Layer::ALL
            .into_iter()
            .map(|layer| {
                let words = config
                    .keywords(layer)
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (layer, words)
            })
            .collect();
        Self { keywords }
    }

    /// Classify a file path or import specifier.
    ///
    /// Layers are tried in priority order (domain, application,
    /// infrastructure, shared) and the first one with a keyword present as a
    /// path segment wins, regardless of where in the path the segment sits.
    pub fn classify(&self, path: &str) -> Option<Layer> {
        let lower = path.to_lowercase();
        let segments: Vec<&str> = path_segments(&lower).collect();

        self.keywords
            .iter()
            .find(|(_, words)| segments.iter().any(|seg| words.iter().any(|w| w == seg)))
            .map(|(layer, _)| *layer)
    }
}

impl Default for LayerClassifier {
    fn default() -> Self {
        Self::new(&LayersConfig::default())
    }
}

/// Split on both separators, dropping empty segments and alias sigils.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .map(|s| s.trim_start_matches(['@', '~']))
        .filter(|s| !s.is_empty())
}
