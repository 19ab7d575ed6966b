use serde::{Deserialize, Serialize};

pub enum AppMode {
    Normal,
    CommandLine,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub enum ScreenEnum {
    Main,
    Help,
}
