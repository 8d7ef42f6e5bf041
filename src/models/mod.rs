pub mod link;

pub use link::{
    AnalyticsEvent, CreateLinkRequest, Link, LinkWithAnalytics, NewAnalyticsEvent, NewLink,
};
