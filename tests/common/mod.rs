pub mod fixtures;
pub mod memory;

#[allow(unused_imports)]
pub use fixtures::{
    at, file_record, folder_record, identity, manager, test_server, test_server_with, TestApp, OWNER,
};
#[allow(unused_imports)]
pub use memory::{Gate, MemoryAuth, MemoryMetadataStore, MemoryObjectStore};
