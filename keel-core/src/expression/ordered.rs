use crate::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

/// A field with its sort direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: Field,
    pub order: Order,
}

impl Ordering {
    pub fn asc(field: Field) -> Self {
        Self {
            field,
            order: Order::ASC,
        }
    }
    pub fn desc(field: Field) -> Self {
        Self {
            field,
            order: Order::DESC,
        }
    }
}

impl Field {
    pub fn asc(&self) -> Ordering {
        Ordering::asc(self.clone())
    }
    pub fn desc(&self) -> Ordering {
        Ordering::desc(self.clone())
    }
}
