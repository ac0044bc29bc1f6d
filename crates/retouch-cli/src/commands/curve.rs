//! Curve command: print the LUT a set of control points produces.

use crate::CurveArgs;
use anyhow::{Context, Result};
use retouch_ops::curves::{Lut, parse_points, try_build_lut};

pub fn run(args: CurveArgs) -> Result<()> {
    let lut = lut_for(&args.points)?;
    if args.json {
        println!("{}", serde_json::to_string(&lut.to_vec())?);
    } else {
        for row in lut.chunks(16) {
            let line: Vec<String> = row.iter().map(|v| format!("{v:>3}")).collect();
            println!("{}", line.join(" "));
        }
    }
    Ok(())
}

/// Parses and builds strictly; a bad curve is reported instead of
/// silently becoming the identity.
fn lut_for(points: &str) -> Result<Lut> {
    let points = parse_points(points).with_context(|| format!("Invalid points: {points}"))?;
    Ok(try_build_lut(&points)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_points() {
        let lut = lut_for("0:0,255:255").unwrap();
        assert!(lut.iter().enumerate().all(|(i, &v)| v as usize == i));
    }

    #[test]
    fn test_lifted_midpoint() {
        let lut = lut_for("0:0, 128:160, 255:255").unwrap();
        assert_eq!(lut[128], 160);
        assert!(lut[64] > 64);
    }

    #[test]
    fn test_rejects_single_point() {
        assert!(lut_for("10:10").is_err());
        assert!(lut_for("a:b").is_err());
    }
}
