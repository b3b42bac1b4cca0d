use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Página más alta aceptada; así el offset siempre cabe en i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

// Response genérica
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

// Parámetros de paginación tal como llegan en la query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// page < 1 pasa a 1 y se limita a MAX_PAGE; page_size ausente o < 1 usa
    /// el default y se limita a MAX_PAGE_SIZE
    pub fn normalize(self) -> Page {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE);
        let page_size = self
            .page_size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Page { page, page_size }
    }
}

// Página ya normalizada que reciben los repositorios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Aplica la página a una lista ya filtrada y ordenada en memoria
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.limit() as usize)
            .cloned()
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        PageRequest::default().normalize()
    }
}

// Listado paginado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.page_size - 1) / page.page_size
        };
        Self {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamping() {
        assert_eq!(
            PageRequest::new(0, 0).normalize(),
            Page { page: 1, page_size: DEFAULT_PAGE_SIZE }
        );
        assert_eq!(
            PageRequest::new(-3, 500).normalize(),
            Page { page: 1, page_size: MAX_PAGE_SIZE }
        );
        assert_eq!(PageRequest::new(3, 20).normalize().offset(), 40);
        assert_eq!(PageRequest::default().normalize().page, 1);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let page = PageRequest::new(i64::MAX, MAX_PAGE_SIZE).normalize();
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() > 0);
        assert!(page.slice(&[1, 2, 3]).is_empty());

        // Una página construida a mano tampoco desborda
        let raw = Page { page: i64::MAX, page_size: MAX_PAGE_SIZE };
        assert_eq!(raw.offset(), i64::MAX);
    }

    #[test]
    fn test_total_pages() {
        let page = PageRequest::new(1, 10).normalize();
        assert_eq!(Paginated::new(Vec::<i32>::new(), 0, page).total_pages, 0);
        assert_eq!(Paginated::new(vec![1], 10, page).total_pages, 1);
        assert_eq!(Paginated::new(vec![1], 11, page).total_pages, 2);
    }

    #[test]
    fn test_slice() {
        let page = PageRequest::new(2, 2).normalize();
        assert_eq!(page.slice(&[1, 2, 3, 4, 5]), vec![3, 4]);
    }
}
