use std::fmt;
use std::str::FromStr;

/// The kind of data a group holds; each category is one top-level section
/// of the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Options,
    BField,
    EField,
    Marker,
    Wall,
    Plasma,
    Neutral,
    Boozer,
    Mhd,
    Asigma,
    /// Simulation output (runs).
    Results,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Options,
        Category::BField,
        Category::EField,
        Category::Marker,
        Category::Wall,
        Category::Plasma,
        Category::Neutral,
        Category::Boozer,
        Category::Mhd,
        Category::Asigma,
        Category::Results,
    ];

    /// Every category a simulation reads as input.
    pub const INPUTS: [Category; 10] = [
        Category::Options,
        Category::BField,
        Category::EField,
        Category::Marker,
        Category::Wall,
        Category::Plasma,
        Category::Neutral,
        Category::Boozer,
        Category::Mhd,
        Category::Asigma,
    ];

    /// Name of the section holding this category.
    pub fn section(self) -> &'static str {
        match self {
            Category::Options => "options",
            Category::BField => "bfield",
            Category::EField => "efield",
            Category::Marker => "marker",
            Category::Wall => "wall",
            Category::Plasma => "plasma",
            Category::Neutral => "neutral",
            Category::Boozer => "boozer",
            Category::Mhd => "mhd",
            Category::Asigma => "asigma",
            Category::Results => "results",
        }
    }

    pub fn is_input(self) -> bool {
        self != Category::Results
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// A category name that matches no section.
#[derive(thiserror::Error, Debug)]
#[error("Unknown category \"{0}\"")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "run" | "runs" => return Ok(Category::Results),
            "opt" => return Ok(Category::Options),
            _ => {}
        }
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.section() == lowered)
            .ok_or(ParseCategoryError(name.to_string()))
    }
}
