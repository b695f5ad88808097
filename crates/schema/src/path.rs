use std::fmt;

/// One step from a JSON container into a child value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
	/// Object member.
	Field(String),
	/// Array element.
	Index(usize),
}

/// Location of a value inside a JSON document, rendered as `$.a[0]["b c"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath(Vec<Segment>);

impl ValuePath {
	/// The document root (`$`).
	pub fn root() -> Self {
		Self::default()
	}

	/// Returns the path of object member `name` below `self`.
	pub fn field(&self, name: &str) -> Self {
		let mut segments = self.0.clone();
		segments.push(Segment::Field(name.to_string()));
		Self(segments)
	}

	/// Returns the path of array element `index` below `self`.
	pub fn index(&self, index: usize) -> Self {
		let mut segments = self.0.clone();
		segments.push(Segment::Index(index));
		Self(segments)
	}

	/// Segments from the root down.
	pub fn segments(&self) -> &[Segment] {
		&self.0
	}

	/// Returns true for the document root.
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for ValuePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("$")?;
		for segment in &self.0 {
			match segment {
				Segment::Field(name) if is_identifier(name) => write!(f, ".{name}")?,
				Segment::Field(name) => write!(f, "[{name:?}]")?,
				Segment::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}
