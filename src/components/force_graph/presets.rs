use std::fmt;
use std::str::FromStr;

/// Simulation knobs, in the units the control bar exposes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
	/// Negative: nodes push each other apart.
	pub repulsion: f64,
	pub central_gravity: f64,
	pub spring_length: f64,
	pub spring_constant: f64,
	pub damping: f64,
	pub avoid_overlap: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutPreset {
	#[default]
	Default,
	Spread,
	Compact,
}

impl LayoutPreset {
	pub const ALL: [LayoutPreset; 3] = [
		LayoutPreset::Spread,
		LayoutPreset::Compact,
		LayoutPreset::Default,
	];

	pub fn params(self) -> PhysicsParams {
		let base = PhysicsParams {
			repulsion: -2000.0,
			central_gravity: 0.3,
			spring_length: 200.0,
			spring_constant: 0.04,
			damping: 0.09,
			avoid_overlap: 0.1,
		};
		match self {
			LayoutPreset::Default => base,
			LayoutPreset::Spread => PhysicsParams {
				repulsion: -3000.0,
				central_gravity: 0.1,
				spring_length: 300.0,
				spring_constant: 0.02,
				..base
			},
			LayoutPreset::Compact => PhysicsParams {
				repulsion: -1000.0,
				central_gravity: 0.8,
				spring_length: 100.0,
				spring_constant: 0.08,
				..base
			},
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			LayoutPreset::Default => "default",
			LayoutPreset::Spread => "spread",
			LayoutPreset::Compact => "compact",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			LayoutPreset::Default => "Default",
			LayoutPreset::Spread => "Spread",
			LayoutPreset::Compact => "Compact",
		}
	}
}

impl fmt::Display for LayoutPreset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for LayoutPreset {
	type Err = std::convert::Infallible;

	/// Unknown names select the default preset.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.trim().to_ascii_lowercase().as_str() {
			"spread" => LayoutPreset::Spread,
			"compact" => LayoutPreset::Compact,
			_ => LayoutPreset::Default,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_name_falls_back_to_default() {
		assert_eq!("SPREAD".parse::<LayoutPreset>(), Ok(LayoutPreset::Spread));
		assert_eq!("wobbly".parse::<LayoutPreset>(), Ok(LayoutPreset::Default));
	}

	#[test]
	fn presets_only_differ_in_forces() {
		let (spread, compact) = (LayoutPreset::Spread.params(), LayoutPreset::Compact.params());
		assert!(spread.spring_length > compact.spring_length);
		assert!(spread.repulsion < compact.repulsion);
		assert_eq!(spread.damping, compact.damping);
		assert_eq!(spread.avoid_overlap, LayoutPreset::Default.params().avoid_overlap);
	}
}
