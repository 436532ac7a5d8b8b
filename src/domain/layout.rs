/// Known result-page layouts of the target site's A/B-tested front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Current live layout (`data-resultid` cards).
    LayoutB,
    /// Legacy layout (`resultWrapper` cards).
    LayoutA,
    Unrecognized,
}

impl LayoutKind {
    /// Detection order: the live layout first.
    pub const PRIORITY: [Self; 2] = [Self::LayoutB, Self::LayoutA];
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayoutB => write!(f, "layout-b"),
            Self::LayoutA => write!(f, "layout-a"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}
