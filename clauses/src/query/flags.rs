//! Tag, folder and priority clauses.

use tracing::debug;

use super::{FOLDER_PLACEHOLDER, TAG_PLACEHOLDER};
use crate::context::{SearchContext, USER_ROOT_FOLDER_ID};
use crate::operation::{
    CompiledOperation, Flag, FolderRef, FolderScope, Predicate, Priority, RelationalOperation,
    TagRef,
};
use crate::{Error, Result};

/// Membership in a tag or system flag.
///
/// The only clause with a sense of its own: `read` is `\Unread` with sense
/// false. Compiling folds the inherited negation into `present`.
#[derive(Debug, Clone, PartialEq)]
pub struct TagClause {
    tag: TagRef,
    sense: bool,
    display: Option<String>,
}

impl TagClause {
    /// Resolve `name` through the mailbox. Names the mailbox does not know
    /// may belong to a shared mailbox and become remote tags.
    pub fn for_name(ctx: &dyn SearchContext, name: &str, sense: bool) -> Self {
        let tag = ctx.lookup_tag(name).unwrap_or_else(|| {
            debug!(clause = "tag", "tag not found locally, matching as remote tag");
            TagRef::Remote {
                name: name.to_string(),
            }
        });
        Self {
            tag,
            sense,
            display: None,
        }
    }

    pub fn flag(flag: Flag, sense: bool, display: impl Into<String>) -> Self {
        Self {
            tag: TagRef::Flag(flag),
            sense,
            display: Some(display.into()),
        }
    }

    pub fn tag(&self) -> &TagRef {
        &self.tag
    }

    pub fn sense(&self) -> bool {
        self.sense
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        CompiledOperation::Relational(RelationalOperation {
            predicate: Predicate::Tag {
                tag: self.tag.clone(),
                present: self.sense ^ negate,
            },
            negated: false,
            label,
        })
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("TAG:");
        out.push_str(self.tag.name());
        if let Some(display) = &self.display {
            out.push(',');
            out.push_str(display);
        }
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        if self.tag.is_flag() {
            self.dump(out);
        } else {
            out.push_str("TAG:");
            out.push_str(TAG_PLACEHOLDER);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FolderTarget {
    Scope(FolderScope),
    Folder(FolderRef),
}

/// Restrict to one folder, or to a class of folders: anywhere, local only,
/// or mounted remote.
#[derive(Debug, Clone, PartialEq)]
pub struct InClause {
    target: FolderTarget,
    include_subfolders: bool,
}

impl InClause {
    pub fn new(scope: FolderScope, include_subfolders: bool) -> Self {
        Self {
            target: FolderTarget::Scope(scope),
            include_subfolders,
        }
    }

    /// `in:` / `under:` by folder name or path.
    pub fn for_folder(ctx: &dyn SearchContext, name: &str, include_subfolders: bool) -> Result<Self> {
        let folder = ctx.lookup_folder(name).ok_or(Error::NoSuchFolder)?;
        Ok(Self::resolved(folder, include_subfolders))
    }

    /// `inid:` / `underid:` by folder id.
    pub fn for_folder_id(ctx: &dyn SearchContext, text: &str, include_subfolders: bool) -> Result<Self> {
        let id: i32 = text
            .trim()
            .parse()
            .map_err(|_| Error::parse("folder", text))?;
        // everything below the root is every folder
        if id == USER_ROOT_FOLDER_ID && include_subfolders {
            return Ok(Self::new(FolderScope::Any, true));
        }
        let folder = ctx.folder_by_id(id).ok_or(Error::NoSuchFolder)?;
        Ok(Self::resolved(folder, include_subfolders))
    }

    fn resolved(folder: FolderRef, include_subfolders: bool) -> Self {
        Self {
            target: FolderTarget::Folder(folder),
            include_subfolders,
        }
    }

    /// The folder class, when this clause is not about a single folder.
    pub fn scope(&self) -> Option<FolderScope> {
        match &self.target {
            FolderTarget::Scope(scope) => Some(*scope),
            FolderTarget::Folder(_) => None,
        }
    }

    pub fn folder(&self) -> Option<&FolderRef> {
        match &self.target {
            FolderTarget::Scope(_) => None,
            FolderTarget::Folder(folder) => Some(folder),
        }
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        let predicate = match &self.target {
            FolderTarget::Scope(scope) => Predicate::Folder {
                scope: *scope,
                include_subfolders: self.include_subfolders,
            },
            FolderTarget::Folder(folder) => Predicate::InFolder {
                folder: folder.clone(),
                include_subfolders: self.include_subfolders,
            },
        };
        CompiledOperation::Relational(RelationalOperation {
            predicate,
            negated: negate,
            label,
        })
    }

    fn prefix(&self) -> &'static str {
        if self.include_subfolders {
            "UNDER:"
        } else {
            "IN:"
        }
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str(self.prefix());
        match &self.target {
            FolderTarget::Scope(scope) => out.push_str(scope.name()),
            FolderTarget::Folder(folder) => {
                out.push('/');
                out.push_str(&folder.name);
            }
        }
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        match &self.target {
            FolderTarget::Scope(_) => self.dump(out),
            FolderTarget::Folder(_) => {
                out.push_str(self.prefix());
                out.push_str(FOLDER_PLACEHOLDER);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityClause {
    priority: Priority,
}

impl PriorityClause {
    pub fn parse(text: &str) -> Result<Self> {
        let priority = match text.trim().to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => return Err(Error::parse("priority", text)),
        };
        Ok(Self { priority })
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        CompiledOperation::Relational(RelationalOperation {
            predicate: Predicate::Priority(self.priority),
            negated: negate,
            label,
        })
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str(match self.priority {
            Priority::High => "PRIORITY:HIGH",
            Priority::Low => "PRIORITY:LOW",
        });
    }
}
