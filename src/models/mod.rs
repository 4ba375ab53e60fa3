pub mod avatar;

pub use avatar::{Avatar, AvatarDocument, AvatarPatch, SectionContent, SectionKind};
