//! ユースケースと HTTP ルートをまたぐテスト

mod fixtures;
mod http_routes_tests;
