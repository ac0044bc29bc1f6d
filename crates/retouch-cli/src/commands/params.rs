//! Params command: print the defaults as a starting point for a look file.

use crate::ParamsArgs;
use anyhow::Result;
use retouch_ops::EffectParams;

pub fn run(args: ParamsArgs) -> Result<()> {
    print!("{}", render(&EffectParams::default(), args.json)?);
    Ok(())
}

fn render(params: &EffectParams, json: bool) -> Result<String> {
    Ok(if json {
        serde_json::to_string_pretty(params)? + "\n"
    } else {
        serde_yaml::to_string(params)?
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reload() {
        let defaults = EffectParams::default();
        let yaml = render(&defaults, false).unwrap();
        assert!(yaml.contains("threshold_white: 255"));
        assert_eq!(serde_yaml::from_str::<EffectParams>(&yaml).unwrap(), defaults);

        let json = render(&defaults, true).unwrap();
        assert_eq!(serde_json::from_str::<EffectParams>(&json).unwrap(), defaults);
    }
}
