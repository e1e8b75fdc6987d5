pub mod mutation_journal;

pub use mutation_journal::MutationJournal;
