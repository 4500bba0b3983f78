//! Actor path - unique address of running actors.

use std::cmp::Ordering;
use std::fmt::{Error, Formatter};

/// Unique, hierarchical address of a running actor, e.g. `/exchange-1/pinger`.
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct ActorPath(Vec<String>);

impl ActorPath {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Self {
        if self.0.len() > 1 {
            let mut tokens = self.0.clone();
            tokens.truncate(tokens.len() - 1);
            ActorPath(tokens)
        } else {
            ActorPath(Vec::new())
        }
    }

    pub fn level(&self) -> usize {
        self.0.len()
    }

    pub fn is_descendant_of(&self, other: &ActorPath) -> bool {
        if other.is_empty() {
            return !self.is_empty();
        }
        self.0.len() > other.0.len() && self.0.starts_with(&other.0)
    }
}

impl From<&str> for ActorPath {
    fn from(str: &str) -> Self {
        let tokens: Vec<String> = str
            .split('/')
            .filter(|x| !x.trim().is_empty())
            .map(|s| s.to_string())
            .collect();
        ActorPath(tokens)
    }
}

impl From<String> for ActorPath {
    fn from(string: String) -> Self {
        ActorPath::from(string.as_str())
    }
}

impl std::ops::Div<&str> for ActorPath {
    type Output = ActorPath;

    fn div(self, rhs: &str) -> Self::Output {
        let mut keys = self.0;
        keys.push(rhs.to_string());
        ActorPath(keys)
    }
}

impl std::fmt::Display for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.level().cmp(&1) {
            Ordering::Less => write!(f, "/"),
            Ordering::Equal => write!(f, "/{}", self.0[0]),
            Ordering::Greater => write!(f, "/{}", self.0.join("/")),
        }
    }
}

impl std::fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = ActorPath::from("/exchange-1//pinger/");
        assert_eq!(path.level(), 2);
        assert_eq!(path.to_string(), "/exchange-1/pinger");
        assert_eq!(ActorPath::from("/").to_string(), "/");
    }

    #[test]
    fn test_compose_with_div() {
        let path = ActorPath::from("/exchange-1") / "ponger";
        assert_eq!(path, ActorPath::from("/exchange-1/ponger"));
        assert_eq!(path.parent(), ActorPath::from("exchange-1"));
    }

    #[test]
    fn test_descendants() {
        let group = ActorPath::from("/exchange-1");
        let pinger = ActorPath::from("/exchange-1/pinger");
        let sibling_group = ActorPath::from("/exchange-10/pinger");

        assert!(pinger.is_descendant_of(&group));
        assert!(!sibling_group.is_descendant_of(&group));
        assert!(!group.is_descendant_of(&group));
        assert_eq!(pinger.parent(), group);
        assert!(group.parent().is_empty());
    }
}
