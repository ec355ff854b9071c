//! Parser configuration.

/// Settings that change how ambiguous report content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Inclusion flag given to hit rows that carry no marker and precede any
    /// `inclusion threshold` divider. Rows after the divider are never included.
    pub assume_included: bool,
    /// Verify that the residues of each reassembled sequence track match the
    /// coordinates reported in the domain table.
    pub check_coordinates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            assume_included: true,
            check_coordinates: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assume_included(mut self, yes: bool) -> Self {
        self.assume_included = yes;
        self
    }

    pub fn check_coordinates(mut self, yes: bool) -> Self {
        self.check_coordinates = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(options.assume_included);
        assert!(options.check_coordinates);
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::new()
            .assume_included(false)
            .check_coordinates(false);
        assert!(!options.assume_included);
        assert!(!options.check_coordinates);
    }
}
