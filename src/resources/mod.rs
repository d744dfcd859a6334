//! Registration table for every collection served by the resource router.
//!
//! Each collection is a zero-sized type carrying its name and ownership
//! policy as constants; `handlers::resource` is instantiated once per type.

use axum::Router;
use serde::Serialize;

use crate::handlers::resource;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Ownership {
    /// Items are scoped to the caller that created them
    PerUser,
    /// Items are visible to everyone, writable by any signed-in caller
    Shared,
}

pub trait Resource: Send + Sync + 'static {
    /// Datastore collection name, also the URL segment under `/api`
    const NAME: &'static str;
    const OWNERSHIP: Ownership;

    fn is_user_owned() -> bool {
        Self::OWNERSHIP == Ownership::PerUser
    }
}

macro_rules! register_resources {
    ($( $(#[$meta:meta])* $ty:ident => $name:literal, $ownership:ident; )+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $ty;

            impl Resource for $ty {
                const NAME: &'static str = $name;
                const OWNERSHIP: Ownership = Ownership::$ownership;
            }
        )+

        /// Every registered collection with its ownership policy
        pub const COLLECTIONS: &[(&str, Ownership)] = &[$(($name, Ownership::$ownership)),+];

        /// Mount each registered collection under `/api/<name>`
        pub fn routes() -> Router<AppState> {
            Router::new()
                $(.nest(concat!("/api/", $name), resource::routes::<$ty>()))+
        }
    };
}

register_resources! {
    LoveNotes => "loveNotes", PerUser;
    /// Bucket list and wedding plans
    Buckets => "buckets", PerUser;
    Timeline => "timeline", PerUser;
    MemoryBox => "memoryBox", PerUser;
    Mood => "mood", PerUser;
    Analytics => "analytics", PerUser;
    Healing => "healing", PerUser;
    Playtime => "playtime", PerUser;
    Couples => "couples", PerUser;
    /// Curated quotes shown to every couple
    Quotes => "quotes", Shared;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::users::USERS_COLLECTION;
    use std::collections::HashSet;

    #[test]
    fn collection_names_are_unique() {
        let names: HashSet<_> = COLLECTIONS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), COLLECTIONS.len());
    }

    #[test]
    fn accounts_are_never_exposed() {
        assert!(COLLECTIONS.iter().all(|(name, _)| *name != USERS_COLLECTION));
    }

    #[test]
    fn ownership_constants() {
        assert!(LoveNotes::is_user_owned());
        assert!(Couples::is_user_owned());
        assert!(!Quotes::is_user_owned());

        let per_user = COLLECTIONS
            .iter()
            .filter(|(_, ownership)| *ownership == Ownership::PerUser)
            .count();
        assert_eq!(per_user, 9);
    }
}
