use crate::error::StoreError;

/// Read side of the opted-in rider list.
pub trait TrackedMembers: Clone + Send + Sync + 'static {
    fn load(&self) -> Result<Vec<u64>, StoreError>;
}
