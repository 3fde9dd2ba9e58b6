diesel::table! {
    categories (id) {
        id -> Integer,
        title -> Text,
        description -> Nullable<Text>,
        abbreviation -> Nullable<Text>,
    }
}

diesel::table! {
    bible_books (id) {
        id -> Integer,
        title -> Text,
        abbreviation -> Text,
        language -> Text,
        book_order -> Integer,
        is_deuterocanonical -> Bool,
        is_old_testament -> Bool,
        is_new_testament -> Bool,
    }
}

diesel::table! {
    books (id) {
        id -> Integer,
        title -> Text,
        abbreviation -> Nullable<Text>,
        language -> Nullable<Text>,
        authors -> Nullable<Text>,
        cover -> Nullable<Text>,
        metadata_json -> Nullable<Text>,
        category_id -> Nullable<Integer>,
    }
}

diesel::table! {
    chapters (id) {
        id -> Integer,
        bible_book_id -> Integer,
        number -> Integer,
        is_ambiguous -> Bool,
    }
}

diesel::table! {
    verses (id) {
        id -> Integer,
        chapter_id -> Integer,
        number -> Nullable<Integer>,
        is_ambiguous -> Bool,
    }
}

diesel::table! {
    contents (id) {
        id -> Integer,
        book_id -> Integer,
        start_verse_id -> Nullable<Integer>,
        end_verse_id -> Nullable<Integer>,
        text -> Text,
    }
}

diesel::joinable!(books -> categories (category_id));
diesel::joinable!(chapters -> bible_books (bible_book_id));
diesel::joinable!(verses -> chapters (chapter_id));
diesel::joinable!(contents -> books (book_id));

diesel::allow_tables_to_appear_in_same_query!(
    categories,
    bible_books,
    books,
    chapters,
    verses,
    contents,
);
