use rusqlite::{params, Connection};

use crate::models::Book;

/// Read every stored book in the order it was saved.
pub(crate) fn fetch_books(conn: &Connection) -> rusqlite::Result<Vec<Book>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, author, publisher, quantity, issued
         FROM books
         ORDER BY position",
    )?;

    let books = stmt
        .query_map([], |row| {
            Ok(Book {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                publisher: row.get(3)?,
                quantity: row.get(4)?,
                issued: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

/// Replace the stored books with `books` inside one transaction.
pub(crate) fn replace_books<'a>(
    conn: &mut Connection,
    books: impl IntoIterator<Item = &'a Book>,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM books", [])?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO books (position, id, title, author, publisher, quantity, issued)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, book) in books.into_iter().enumerate() {
            stmt.execute(params![
                position as i64,
                book.id,
                book.title,
                book.author,
                book.publisher,
                book.quantity,
                book.issued,
            ])?;
            written += 1;
        }
    }
    tx.commit()?;
    Ok(written)
}
