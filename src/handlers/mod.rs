mod meeting_prep;

pub use meeting_prep::meeting_prep;
