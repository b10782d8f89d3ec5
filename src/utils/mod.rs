pub mod descriptor_cache;
