#[cfg(unix)]
const DEFAULT_PERMISSIONS: u32 = 0o644;

#[cfg(not(unix))]
const DEFAULT_PERMISSIONS: u32 = 0;

/// How [`LocalFs`](crate::LocalFs) opens files.
#[derive(Clone, Copy, Debug)]
pub struct SinkOptions {
    create_parents: bool,
    permissions:    u32,
}

impl Default for SinkOptions {
    fn default() -> Self { Self::new() }
}

impl SinkOptions {
    pub fn new() -> Self {
        Self {
            create_parents: true,
            permissions:    DEFAULT_PERMISSIONS,
        }
    }

    /// Create missing parent directories before opening. Default: `true`.
    pub fn create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }

    /// Mode for newly created files.
    #[cfg(unix)]
    pub fn permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    #[cfg(not(unix))]
    pub fn permissions(self, _permissions: u32) -> Self { self }

    pub fn get_create_parents(&self) -> bool { self.create_parents }

    pub fn get_permissions(&self) -> u32 { self.permissions }
}
