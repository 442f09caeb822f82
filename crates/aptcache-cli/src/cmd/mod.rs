pub mod create_key;
pub mod normalized_list;
