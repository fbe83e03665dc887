// Core algorithm exports
pub mod astro;
pub mod correlator;
pub mod matcher;
pub mod scoring;
pub mod signs;

pub use astro::{astro_compat, AstroCompatibility, ElementalHarmony, ModalityAlignment};
pub use correlator::{combine, Correlation};
pub use matcher::{CompatibilityReport, Matcher};
pub use scoring::{calculate_palm_scores, prominence_compatible, PalmScores};
pub use signs::{sign_for_date, Element, Modality, Ruler, Sign};
