mod project;

pub use project::ProjectRecord;
