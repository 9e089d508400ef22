//! The 17 crop-disease classes and their treatment advisories.
//!
//! Variant order is the output index order of the classifier head. Reordering
//! the variants silently corrupts every prediction, so `ALL` is the single
//! source of truth for index <-> label conversion.

use std::fmt;
use std::str::FromStr;

pub const NUM_CLASSES: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crop {
    Corn,
    Potato,
    Rice,
    Wheat,
    Sugarcane,
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Crop::Corn => "Corn",
            Crop::Potato => "Potato",
            Crop::Rice => "Rice",
            Crop::Wheat => "Wheat",
            Crop::Sugarcane => "Sugarcane",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    CornCommonRust,
    CornGrayLeafSpot,
    CornNorthernLeafBlight,
    CornHealthy,
    PotatoEarlyBlight,
    PotatoLateBlight,
    PotatoHealthy,
    RiceBrownSpot,
    RiceLeafBlast,
    RiceNeckBlast,
    RiceHealthy,
    WheatBrownRust,
    WheatYellowRust,
    WheatHealthy,
    SugarcaneRedRot,
    SugarcaneBacterialBlight,
    SugarcaneHealthy,
}

const HEALTHY_ADVISORY: &str = "The crop appears healthy with no visible disease symptoms.";

impl ClassLabel {
    /// Every label, indexed by model output position.
    pub const ALL: [ClassLabel; NUM_CLASSES] = [
        ClassLabel::CornCommonRust,
        ClassLabel::CornGrayLeafSpot,
        ClassLabel::CornNorthernLeafBlight,
        ClassLabel::CornHealthy,
        ClassLabel::PotatoEarlyBlight,
        ClassLabel::PotatoLateBlight,
        ClassLabel::PotatoHealthy,
        ClassLabel::RiceBrownSpot,
        ClassLabel::RiceLeafBlast,
        ClassLabel::RiceNeckBlast,
        ClassLabel::RiceHealthy,
        ClassLabel::WheatBrownRust,
        ClassLabel::WheatYellowRust,
        ClassLabel::WheatHealthy,
        ClassLabel::SugarcaneRedRot,
        ClassLabel::SugarcaneBacterialBlight,
        ClassLabel::SugarcaneHealthy,
    ];

    pub fn from_index(index: usize) -> Option<ClassLabel> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name, e.g. `"Rice - Leaf Blast"`.
    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::CornCommonRust => "Corn - Common Rust",
            ClassLabel::CornGrayLeafSpot => "Corn - Gray Leaf Spot",
            ClassLabel::CornNorthernLeafBlight => "Corn - Northern Leaf Blight",
            ClassLabel::CornHealthy => "Corn - Healthy",
            ClassLabel::PotatoEarlyBlight => "Potato - Early Blight",
            ClassLabel::PotatoLateBlight => "Potato - Late Blight",
            ClassLabel::PotatoHealthy => "Potato - Healthy",
            ClassLabel::RiceBrownSpot => "Rice - Brown Spot",
            ClassLabel::RiceLeafBlast => "Rice - Leaf Blast",
            ClassLabel::RiceNeckBlast => "Rice - Neck Blast",
            ClassLabel::RiceHealthy => "Rice - Healthy",
            ClassLabel::WheatBrownRust => "Wheat - Brown Rust",
            ClassLabel::WheatYellowRust => "Wheat - Yellow Rust",
            ClassLabel::WheatHealthy => "Wheat - Healthy",
            ClassLabel::SugarcaneRedRot => "Sugarcane - Red Rot",
            ClassLabel::SugarcaneBacterialBlight => "Sugarcane - Bacterial Blight",
            ClassLabel::SugarcaneHealthy => "Sugarcane - Healthy",
        }
    }

    pub fn crop(self) -> Crop {
        match self.index() {
            0..=3 => Crop::Corn,
            4..=6 => Crop::Potato,
            7..=10 => Crop::Rice,
            11..=13 => Crop::Wheat,
            _ => Crop::Sugarcane,
        }
    }

    pub fn is_healthy(self) -> bool {
        matches!(
            self,
            ClassLabel::CornHealthy
                | ClassLabel::PotatoHealthy
                | ClassLabel::RiceHealthy
                | ClassLabel::WheatHealthy
                | ClassLabel::SugarcaneHealthy
        )
    }

    /// Treatment advisory shown next to the top prediction.
    pub fn advisory(self) -> &'static str {
        match self {
            ClassLabel::CornCommonRust => {
                "A fungal disease that produces reddish-brown pustules on leaves. \
                 Treatment: Use resistant hybrids and apply fungicides if severe."
            }
            ClassLabel::CornGrayLeafSpot => {
                "Caused by Cercospora fungus leading to rectangular gray lesions. \
                 Treatment: Crop rotation and fungicide application."
            }
            ClassLabel::CornNorthernLeafBlight => {
                "Characterized by long cigar-shaped lesions on leaves. \
                 Treatment: Use resistant varieties and timely fungicide spray."
            }
            ClassLabel::PotatoEarlyBlight => {
                "Fungal disease causing dark target-like spots on leaves. \
                 Treatment: Maintain proper spacing and apply protective fungicides."
            }
            ClassLabel::PotatoLateBlight => {
                "Serious disease causing rapid leaf decay. \
                 Treatment: Use certified seed and fungicide protection."
            }
            ClassLabel::RiceBrownSpot => {
                "Fungal disease causing brown lesions on leaves. \
                 Treatment: Improve soil fertility and apply fungicides."
            }
            ClassLabel::RiceLeafBlast => {
                "Common fungal infection producing diamond-shaped lesions. \
                 Treatment: Use resistant varieties and proper nitrogen management."
            }
            ClassLabel::RiceNeckBlast => {
                "Severe blast affecting the neck of panicle. \
                 Treatment: Early fungicide application and resistant cultivars."
            }
            ClassLabel::WheatBrownRust => {
                "Produces orange-brown pustules on leaves. \
                 Treatment: Grow resistant varieties and apply fungicides."
            }
            ClassLabel::WheatYellowRust => {
                "Causes yellow stripe-like pustules. \
                 Treatment: Use resistant seeds and fungicide spray."
            }
            ClassLabel::SugarcaneRedRot => {
                "Internal reddening of stalk tissues. \
                 Treatment: Use disease-free setts and proper field sanitation."
            }
            ClassLabel::SugarcaneBacterialBlight => {
                "Water-soaked streaks and leaf wilting. \
                 Treatment: Use clean planting material and field hygiene."
            }
            ClassLabel::CornHealthy
            | ClassLabel::PotatoHealthy
            | ClassLabel::RiceHealthy
            | ClassLabel::WheatHealthy
            | ClassLabel::SugarcaneHealthy => HEALTHY_ADVISORY,
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown class label {:?}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for ClassLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.name() == wanted)
            .ok_or_else(|| UnknownLabel(wanted.to_string()))
    }
}
