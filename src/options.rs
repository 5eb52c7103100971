/// Struct names left out of the block listing of a `Report`. These are screen and UI bookkeeping structs, there are
/// hundreds of them in any file saved from the UI.
pub const DEFAULT_REPORT_DENYLIST: [&str; 4] = ["ScrVert", "Panel", "ScrEdge", "ARegion"];

/// Options used when loading a blend file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Try to decompress the file when it doesn't start with the `BLENDER` magic. Enabled by default.
    pub decompress: bool,
    /// See `DEFAULT_REPORT_DENYLIST`.
    pub report_denylist: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            decompress: true,
            report_denylist: DEFAULT_REPORT_DENYLIST
                .iter()
                .map(|s| String::from(*s))
                .collect(),
        }
    }
}

impl LoadOptions {
    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    pub fn report_denylist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_denylist = names.into_iter().map(Into::into).collect();
        self
    }
}
