use askama::Template;

#[derive(Template)]
#[template(path = "header.md", escape = "none")]
pub(crate) struct HeaderTemplate<'a> {
    pub(crate) community: &'a str,
    pub(crate) lookahead_hours: i64,
}

#[derive(Template)]
#[template(path = "empty_state.md", escape = "none")]
pub(crate) struct EmptyStateTemplate;

pub(crate) struct CategoryLine {
    pub(crate) badge: String,
    pub(crate) start: String,
    pub(crate) access: String,
    pub(crate) route: String,
    pub(crate) world: String,
    pub(crate) rules: String,
}

#[derive(Template)]
#[template(path = "categories.md", escape = "none")]
pub(crate) struct CategoriesTemplate<'a> {
    pub(crate) lines: &'a [CategoryLine],
}

#[derive(Template)]
#[template(path = "lookup_reply.md", escape = "none")]
pub(crate) struct LookupReplyTemplate<'a> {
    pub(crate) lines: &'a [(String, String)],
}
