// src/pagination.rs
use serde::Serialize;

use crate::errors::{TaxiError, TaxiResult};

/// Page metadata exposed to list templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageObj {
    pub number: usize,
    pub num_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    /// Total number of items across all pages.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub object_list: Vec<T>,
    pub page_obj: PageObj,
    pub is_paginated: bool,
}

impl<T> Paginated<T> {
    /// Same page, different objects (e.g. records with their relations resolved).
    pub fn with_object_list<U>(self, object_list: Vec<U>) -> Paginated<U> {
        Paginated {
            object_list,
            page_obj: self.page_obj,
            is_paginated: self.is_paginated,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self, count: usize) -> usize {
        // An empty list still has one (empty) first page.
        count.div_ceil(self.per_page).max(1)
    }

    /// Slices `items` to the requested 1-based page. A missing or blank page
    /// means the first one and `last` the final one; anything else that is not
    /// a page number in range is a 404.
    pub fn paginate<T>(&self, items: Vec<T>, page: Option<&str>) -> TaxiResult<Paginated<T>> {
        let count = items.len();
        let num_pages = self.num_pages(count);

        let number = match page.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| TaxiError::not_found(format!("Invalid page ({})", raw)))?,
        };
        if number == 0 || number > num_pages {
            return Err(TaxiError::not_found(format!("Invalid page ({})", number)));
        }

        let object_list = items
            .into_iter()
            .skip((number - 1) * self.per_page)
            .take(self.per_page)
            .collect();

        Ok(Paginated {
            object_list,
            page_obj: PageObj {
                number,
                num_pages,
                has_next: number < num_pages,
                has_previous: number > 1,
                next_page_number: (number < num_pages).then_some(number + 1),
                previous_page_number: (number > 1).then(|| number - 1),
                count,
            },
            is_paginated: num_pages > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last_page() {
        let paginator = Paginator::new(5);
        let items: Vec<u32> = (1..=12).collect();

        let first = paginator.paginate(items.clone(), None).unwrap();
        assert_eq!(first.object_list, vec![1, 2, 3, 4, 5]);
        assert!(first.is_paginated);
        assert_eq!(first.page_obj.num_pages, 3);
        assert_eq!(first.page_obj.next_page_number, Some(2));
        assert_eq!(first.page_obj.previous_page_number, None);

        let last = paginator.paginate(items, Some("last")).unwrap();
        assert_eq!(last.object_list, vec![11, 12]);
        assert!(!last.page_obj.has_next);
        assert_eq!(last.page_obj.next_page_number, None);
        assert_eq!(last.page_obj.previous_page_number, Some(2));
        assert_eq!(last.page_obj.count, 12);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let page = Paginator::new(5).paginate(Vec::<u32>::new(), Some("1")).unwrap();
        assert!(page.object_list.is_empty());
        assert!(!page.is_paginated);
        assert_eq!(page.page_obj.num_pages, 1);
    }

    #[test]
    fn test_invalid_pages_are_not_found() {
        let paginator = Paginator::new(5);
        for page in ["0", "3", "abc", "-1"] {
            let result = paginator.paginate((1..=6).collect::<Vec<u32>>(), Some(page));
            assert!(result.unwrap_err().is_not_found(), "page {}", page);
        }
    }
}
