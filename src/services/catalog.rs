//! Book catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{is_valid_isbn, normalize_isbn, Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book. ISBNs are stored hyphen-free and must be unique.
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        use validator::Validate;
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if !is_valid_isbn(&book.isbn) {
            return Err(AppError::Validation(
                "ISBN must be 13 digits, or 9 digits followed by a digit or X".to_string(),
            ));
        }

        let isbn = normalize_isbn(&book.isbn);
        if self.repository.books.isbn_exists(&isbn, None).await? {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        let created = self.repository.books.create(&book, &isbn).await?;

        tracing::info!("Created book '{}' (id {})", created.title, created.id);

        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        use validator::Validate;
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        // Check if book exists
        self.repository.books.get_by_id(id).await?;

        let isbn = match book.isbn {
            Some(ref raw) => {
                if !is_valid_isbn(raw) {
                    return Err(AppError::Validation(
                        "ISBN must be 13 digits, or 9 digits followed by a digit or X".to_string(),
                    ));
                }
                let normalized = normalize_isbn(raw);
                if self
                    .repository
                    .books
                    .isbn_exists(&normalized, Some(id))
                    .await?
                {
                    return Err(AppError::Conflict(
                        "A book with this ISBN already exists".to_string(),
                    ));
                }
                Some(normalized)
            }
            None => None,
        };

        self.repository.books.update(id, &book, isbn).await
    }

    /// Delete a book (cascade removes its issue records)
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}
