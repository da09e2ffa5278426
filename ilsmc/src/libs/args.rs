use std::path::PathBuf;

use color_eyre::Result;

use ilsmc_core::ModelParams;

use crate::io::read_params_json;

/// Branch lengths, rates and interval counts of the model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ModelArgs {
    /// JSON file with all model parameters, replaces the values given as flags
    #[cfg_attr(feature = "clap", arg(long, value_hint = clap::ValueHint::FilePath))]
    pub config: Option<PathBuf>,

    /// Length of branch A
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 0.1))]
    pub t_a: f64,

    /// Length of branch B
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 0.1))]
    pub t_b: f64,

    /// Length of the internal branch AB
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub t_ab: f64,

    /// Length of branch C
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 2.0))]
    pub t_c: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 2.0))]
    pub rho_a: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub rho_b: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 3.0))]
    pub rho_ab: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub rho_c: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub rho_abc: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub coal_a: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 0.5))]
    pub coal_b: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub coal_ab: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub coal_c: f64,

    #[cfg_attr(feature = "clap", arg(long, default_value_t = 1.0))]
    pub coal_abc: f64,

    /// Number of intervals of branch AB
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 3))]
    pub n_int_ab: usize,

    /// Number of intervals of the root branch ABC
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 3))]
    pub n_int_abc: usize,
}

impl Default for ModelArgs {
    fn default() -> Self {
        Self::from(ModelParams::default())
    }
}

impl From<ModelParams> for ModelArgs {
    fn from(p: ModelParams) -> Self {
        Self {
            config: None,
            t_a: p.t_a,
            t_b: p.t_b,
            t_ab: p.t_ab,
            t_c: p.t_c,
            rho_a: p.rho_a,
            rho_b: p.rho_b,
            rho_ab: p.rho_ab,
            rho_c: p.rho_c,
            rho_abc: p.rho_abc,
            coal_a: p.coal_a,
            coal_b: p.coal_b,
            coal_ab: p.coal_ab,
            coal_c: p.coal_c,
            coal_abc: p.coal_abc,
            n_int_ab: p.n_int_ab,
            n_int_abc: p.n_int_abc,
        }
    }
}

impl ModelArgs {
    /// The parameter record, read from `--config` when one is given
    pub fn params(&self) -> Result<ModelParams> {
        if let Some(path) = &self.config {
            tracing::info!("Reading model parameters from {path:?}");
            return read_params_json(path);
        }

        Ok(ModelParams {
            t_a: self.t_a,
            t_b: self.t_b,
            t_ab: self.t_ab,
            t_c: self.t_c,
            rho_a: self.rho_a,
            rho_b: self.rho_b,
            rho_ab: self.rho_ab,
            rho_c: self.rho_c,
            rho_abc: self.rho_abc,
            coal_a: self.coal_a,
            coal_b: self.coal_b,
            coal_ab: self.coal_ab,
            coal_c: self.coal_c,
            coal_abc: self.coal_abc,
            n_int_ab: self.n_int_ab,
            n_int_abc: self.n_int_abc,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct OutputArgs {
    /// Output directory, `-` writes to stdout
    #[cfg_attr(feature = "clap", arg(short = 'o', long="outdir", default_value_os_t = PathBuf::from("./"), value_hint = clap::ValueHint::DirPath))]
    pub output: PathBuf,

    /// Output filename prefix
    #[cfg_attr(feature = "clap", arg(short = 'p', long))]
    pub prefix: Option<String>,

    /// Write tab separated values instead of csv
    #[cfg_attr(feature = "clap", arg(long))]
    pub tsv: bool,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./"),
            prefix: None,
            tsv: false,
        }
    }
}

impl OutputArgs {
    pub fn is_stdout(&self) -> bool {
        self.output.to_str() == Some("-")
    }

    pub fn extension(&self) -> &'static str {
        match self.tsv {
            true => "tsv",
            false => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_documented_example() {
        let args = ModelArgs::default();
        assert_eq!(args.params().unwrap(), ModelParams::default());
        assert_eq!(args.coal_b, 0.5);
        assert_eq!(args.n_int_abc, 3);
    }

    #[test]
    fn output_kind() {
        let mut args = OutputArgs::default();
        assert!(!args.is_stdout());
        assert_eq!(args.extension(), "csv");

        args.output = PathBuf::from("-");
        args.tsv = true;
        assert!(args.is_stdout());
        assert_eq!(args.extension(), "tsv");
    }
}
