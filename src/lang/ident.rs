// Used by the cruncher, the variable table and the user function manager.

/// The four BASIC value types, in promotion order for the numerics.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum Type {
    Integer,
    Single,
    Double,
    String,
}

impl Type {
    pub fn from_suffix(ch: char) -> Option<Type> {
        match ch {
            '%' => Some(Type::Integer),
            '!' => Some(Type::Single),
            '#' => Some(Type::Double),
            '$' => Some(Type::String),
            _ => None,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            Type::Integer => '%',
            Type::Single => '!',
            Type::Double => '#',
            Type::String => '$',
        }
    }

    /// The explicit suffix of an identifier, if it carries one.
    pub fn of_name(name: &str) -> Option<Type> {
        name.chars().last().and_then(Type::from_suffix)
    }

    pub fn is_string(self) -> bool {
        self == Type::String
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Type::*;
        match self {
            Integer => write!(f, "INTEGER"),
            Single => write!(f, "SINGLE"),
            Double => write!(f, "DOUBLE"),
            String => write!(f, "STRING"),
        }
    }
}
