//! Template Matcher Adapters

mod keyword;

pub use keyword::KeywordTemplateMatcher;
