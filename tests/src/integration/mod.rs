//! Cross-component integration flows

pub mod flows;
