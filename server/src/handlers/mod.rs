pub mod article_handlers;
