//! Generic data-access interface
//!
//! Every persisted model is reached through a repository implementing this
//! trait; handlers and seeders depend on the trait, not on SQL.

/// CRUD operations over one model, with soft deletion
pub trait Repository {
    /// The stored record
    type Model;
    /// Attributes required to create a record
    type NewModel;
    /// Partial attributes applied by `update`
    type Changes;
    type Error;

    /// Every live (not soft-deleted) record
    fn all(&self) -> Result<Vec<Self::Model>, Self::Error>;

    /// A live record by primary key
    fn find(&self, id: i64) -> Result<Option<Self::Model>, Self::Error>;

    fn create(&self, attributes: Self::NewModel) -> Result<Self::Model, Self::Error>;

    /// Apply `attributes` to `object` and return the persisted record
    fn update(
        &self,
        attributes: Self::Changes,
        object: &Self::Model,
    ) -> Result<Self::Model, Self::Error>;

    /// Soft-delete; returns whether a live record was deleted
    fn delete(&self, object: &Self::Model) -> Result<bool, Self::Error>;

    /// Undo a soft delete
    fn restore(&self, object: &Self::Model) -> Result<Self::Model, Self::Error>;

    /// Remove the record permanently
    fn force_delete(&self, object: &Self::Model) -> Result<bool, Self::Error>;
}
