//! Line-oriented parameter files
//!
//! ```text
//! # comment
//! pendulumHeight 2.02
//! pendulumLength 2.0
//! gravity 9.81
//! damping 1.0
//! magFactor 0.01
//! maxTheta 5.0
//!
//! magnet <x> <y> <r> <g> <b> <alpha>
//! ```
//!
//! Unknown keys and malformed lines are skipped. A file without any valid
//! `magnet` line yields the three default magnets.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::simulation::params::Parameters;
use crate::simulation::states::{default_magnets, Magnet};

#[derive(Debug, Error)]
pub enum ParamFileError {
    #[error("cannot access parameter file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything a parameter file describes
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    pub parameters: Parameters,
    pub magnets: Vec<Magnet>,
}

/// Parse parameter text on top of `base`; keys missing from the text keep
/// their `base` values
pub fn parse_params(text: &str, base: &Parameters) -> ParamSet {
    let mut parameters = base.clone();
    let mut magnets = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            debug!("line {}: skipped '{line}'", lineno + 1);
            continue;
        }

        let slot = match tokens[0] {
            "pendulumHeight" => &mut parameters.pendulum_height,
            "pendulumLength" => &mut parameters.pendulum_length,
            "gravity" => &mut parameters.gravity,
            "damping" => &mut parameters.damping,
            "magFactor" => &mut parameters.mag_factor,
            "maxTheta" => &mut parameters.max_theta,
            "magnet" => {
                match parse_magnet(&tokens[1..], magnets.len()) {
                    Some(m) => magnets.push(m),
                    None => debug!("line {}: malformed magnet '{line}'", lineno + 1),
                }
                continue;
            }
            _ => continue,
        };

        match tokens[1].parse::<f64>() {
            Ok(v) => *slot = v,
            Err(_) => debug!("line {}: bad value for {}", lineno + 1, tokens[0]),
        }
    }

    if magnets.is_empty() {
        warn!("no magnets in parameter file, installing defaults");
        magnets = default_magnets();
    }

    ParamSet { parameters, magnets }
}

// x y r g b alpha
fn parse_magnet(tokens: &[&str], index: usize) -> Option<Magnet> {
    if tokens.len() < 6 {
        return None;
    }
    let x = tokens[0].parse::<f64>().ok()?;
    let y = tokens[1].parse::<f64>().ok()?;
    let r = tokens[2].parse::<f32>().ok()?;
    let g = tokens[3].parse::<f32>().ok()?;
    let b = tokens[4].parse::<f32>().ok()?;
    let alpha = tokens[5].parse::<f64>().ok()?;
    Some(Magnet::new(x, y, alpha, [r, g, b], index))
}

/// Render parameters and magnets in the file format
pub fn format_params(params: &Parameters, magnets: &[Magnet]) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(out, "pendulumHeight {}", params.pendulum_height);
    let _ = writeln!(out, "pendulumLength {}", params.pendulum_length);
    let _ = writeln!(out, "gravity {}", params.gravity);
    let _ = writeln!(out, "damping {}", params.damping);
    let _ = writeln!(out, "magFactor {}", params.mag_factor);
    let _ = writeln!(out, "maxTheta {}", params.max_theta);
    let _ = writeln!(out);
    for m in magnets {
        let _ = writeln!(
            out,
            "magnet {} {} {} {} {} {}",
            m.pos.x, m.pos.y, m.color[0], m.color[1], m.color[2], m.alpha
        );
    }
    out
}

pub fn load_params<P: AsRef<Path>>(path: P, base: &Parameters) -> Result<ParamSet, ParamFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ParamFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_params(&text, base);
    info!("loaded {} magnets from {}", set.magnets.len(), path.display());
    Ok(set)
}

pub fn save_params<P: AsRef<Path>>(path: P, params: &Parameters, magnets: &[Magnet]) -> Result<(), ParamFileError> {
    let path = path.as_ref();
    fs::write(path, format_params(params, magnets)).map_err(|source| ParamFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("saved parameters to {}", path.display());
    Ok(())
}
