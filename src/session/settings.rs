//! User settings stored by the daemon
//!
//! Settings are values: every change produces a new `Settings` that is sent
//! to the daemon as a whole.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    H4x0r,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "h4x0r" => Ok(Theme::H4x0r),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiFont {
    #[default]
    Inter,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodeFont {
    #[default]
    SourceCode,
    System,
}

/// Dismissible hints shown in the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hints {
    pub show_remote_helper: bool,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            show_remote_helper: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub theme: Theme,
    pub ui_font: UiFont,
    pub code_font: CodeFont,
    pub hints: Hints,
}

/// Peer network configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoCo {
    /// Bootstrap peer addresses, unique and in insertion order
    pub seeds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub appearance: Appearance,
    pub coco: CoCo,
}

impl Settings {
    pub fn with_appearance(self, appearance: Appearance) -> Self {
        Self { appearance, ..self }
    }

    pub fn with_remote_helper_hint_dismissed(self) -> Self {
        let appearance = Appearance {
            hints: Hints {
                show_remote_helper: false,
            },
            ..self.appearance
        };
        Self { appearance, ..self }
    }

    pub fn has_seed(&self, seed: &str) -> bool {
        self.coco.seeds.iter().any(|s| s == seed)
    }

    /// Append `seed` unless it is already present
    pub fn with_seed(self, seed: &str) -> Self {
        if self.has_seed(seed) {
            return self;
        }
        let mut seeds = self.coco.seeds;
        seeds.push(seed.to_string());
        Self {
            coco: CoCo { seeds },
            ..self
        }
    }

    pub fn without_seed(self, seed: &str) -> Self {
        let seeds = self
            .coco
            .seeds
            .into_iter()
            .filter(|s| s != seed)
            .collect();
        Self {
            coco: CoCo { seeds },
            ..self
        }
    }
}
