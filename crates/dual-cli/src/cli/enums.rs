use clap::ValueEnum;
use dual_config::DifferentialMode;

/// Whether to run the modern pass
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum Differential {
    /// Decide from the declared browser targets
    #[value(name = "auto")]
    Auto,

    /// Always run the modern pass
    #[value(name = "on")]
    On,

    /// Never run the modern pass
    #[value(name = "off")]
    Off,
}

impl From<Differential> for DifferentialMode {
    fn from(value: Differential) -> Self {
        match value {
            Differential::Auto => DifferentialMode::Auto,
            Differential::On => DifferentialMode::On,
            Differential::Off => DifferentialMode::Off,
        }
    }
}
