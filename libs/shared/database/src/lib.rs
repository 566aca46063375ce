pub mod supabase;
pub mod users;

pub use supabase::SupabaseClient;
pub use users::{NewUser, UserStore};
