pub struct Icons;

impl Icons {
    pub const BOOKS: &str = "📚";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const GLOBE: &str = "🌐";
    pub const SKIP: &str = "⏭️";
    pub const EMPTY: &str = "∅";
}
