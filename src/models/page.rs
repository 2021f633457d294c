use crate::errors::AppError;

/// Offset/limit window applied after filtering and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(from: i64, size: i64) -> Result<Self, AppError> {
        if from < 0 {
            return Err(AppError::Validation(format!(
                "from must not be negative, got {from}"
            )));
        }
        if size <= 0 {
            return Err(AppError::Validation(format!(
                "size must be positive, got {size}"
            )));
        }
        Ok(Self {
            offset: from,
            limit: size,
        })
    }

    /// Caps the page size without touching the offset.
    pub fn capped(self, max: i64) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}
