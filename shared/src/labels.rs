use std::collections::BTreeMap;

use crate::palette::Color;

/// Free-text label per color. Purely descriptive: labels never affect which
/// regions a color occupies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRegistry {
    labels: BTreeMap<Color, String>,
}

impl LabelRegistry {
    /// Set the label for `color`. Empty text removes it.
    pub fn set(&mut self, color: Color, text: &str) {
        if text.is_empty() {
            self.labels.remove(&color);
        } else {
            self.labels.insert(color, text.to_owned());
        }
    }

    /// Label text, or `""` when the color has none.
    pub fn get(&self, color: &Color) -> &str {
        self.labels.get(color).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Color, &str)> {
        self.labels.iter().map(|(c, t)| (c, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

impl FromIterator<(Color, String)> for LabelRegistry {
    fn from_iter<T: IntoIterator<Item = (Color, String)>>(iter: T) -> Self {
        let mut registry = Self::default();
        for (color, text) in iter {
            registry.set(color, &text);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_the_same_as_no_label() {
        let crimson = Color::new("#DC143C");
        let mut labels = LabelRegistry::default();

        labels.set(crimson.clone(), "Red team");
        assert_eq!(labels.get(&crimson), "Red team");

        labels.set(crimson.clone(), "");
        assert_eq!(labels.get(&crimson), "");
        assert!(labels.is_empty());
    }

    #[test]
    fn whitespace_text_is_kept_verbatim() {
        let gold = Color::new("#FFD700");
        let mut labels = LabelRegistry::default();
        labels.set(gold.clone(), "  ");
        assert_eq!(labels.get(&gold), "  ");
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn set_overwrites_previous_text() {
        let blue = Color::new("#1E90FF");
        let mut labels = LabelRegistry::default();
        labels.set(blue.clone(), "Alpha");
        labels.set(blue.clone(), "Bravo");
        assert_eq!(labels.get(&blue), "Bravo");
        assert_eq!(labels.len(), 1);
    }
}
