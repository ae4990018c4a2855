use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "motra-presale")]
#[command(author = "motra")]
#[command(version)]
#[command(about = "A TUI client for purchasing MOTRA presale tokens with USDC")]
pub struct Args {
    /// Tick rate in ticks per second
    #[arg(short, long, default_value_t = 4.0, value_parser = parse_rate)]
    pub tick_rate: f64,

    /// Frame rate in frames per second
    #[arg(short, long, default_value_t = 60.0, value_parser = parse_rate)]
    pub frame_rate: f64,

    /// Network to connect to (base, base-sepolia, devnet)
    #[arg(short, long, default_value = "base")]
    pub network: String,

    /// Custom RPC URL (overrides network default)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Seconds between chain state refreshes (overrides config)
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Rates are divided into one second, so they must be positive and finite.
fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("rate must be greater than 0, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["motra-presale"]).unwrap();
        assert_eq!(args.tick_rate, 4.0);
        assert_eq!(args.frame_rate, 60.0);
        assert_eq!(args.network, "base");
    }

    #[test]
    fn test_zero_rates_rejected() {
        assert!(Args::try_parse_from(["motra-presale", "--tick-rate", "0"]).is_err());
        assert!(Args::try_parse_from(["motra-presale", "--frame-rate", "0"]).is_err());
        assert!(Args::try_parse_from(["motra-presale", "--frame-rate", "-1"]).is_err());
        assert!(Args::try_parse_from(["motra-presale", "--tick-rate", "inf"]).is_err());

        let args = Args::try_parse_from(["motra-presale", "--tick-rate", "0.5"]).unwrap();
        assert_eq!(args.tick_rate, 0.5);
    }
}
