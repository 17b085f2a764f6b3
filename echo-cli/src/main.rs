use std::fs;
use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echo_client::{
    AuthResponse, Comment, EchoClient, EchoClientError, FeedSort, ListPostsResponse,
    ModerationResponse, Post, Stats, TagCount, User, Uuid,
};
use serde::{Deserialize, Serialize};

const SESSION_FILE: &str = ".echo_session";
const DEFAULT_HTTP_SERVER: &str = "http://127.0.0.1:8080";
const SERVER_ENV: &str = "ECHO_HTTP_URL";

#[derive(Debug, Parser)]
#[command(name = "echo-cli", version, about = "CLI клиент для echo-server")]
struct Cli {
    /// Адрес сервера. По умолчанию берётся из ECHO_HTTP_URL.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Проверка доступности сервера.
    Health,
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Выход и удаление сохранённой сессии.
    Logout,
    /// Действовать от имени пользователя без токена.
    ActAs {
        #[arg(long)]
        username: String,
    },
    /// Лента постов.
    List {
        #[arg(long, default_value = "recent")]
        sort: FeedSort,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Поиск по заголовку, тексту, автору и тегам.
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Получение поста по id.
    Get {
        #[arg(long)]
        id: Uuid,
    },
    /// Создание поста (нужна сессия).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Хэштег, можно повторять: --tag rust --tag "#async".
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Удаление поста (нужна сессия).
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Поставить или снять лайк.
    Like {
        #[arg(long)]
        id: Uuid,
    },
    /// Поставить или снять дизлайк.
    Dislike {
        #[arg(long)]
        id: Uuid,
    },
    /// Комментарий к посту.
    Comment {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        text: String,
    },
    /// Добавить пост в закладки или убрать его оттуда.
    Bookmark {
        #[arg(long)]
        id: Uuid,
    },
    /// Закладки пользователя (по умолчанию свои).
    Bookmarks {
        #[arg(long)]
        username: Option<String>,
    },
    /// Популярные хэштеги.
    Trending {
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },
    /// Список пользователей.
    Users,
    /// Пользователи онлайн.
    Online,
    /// Профиль пользователя.
    User {
        #[arg(long)]
        username: String,
    },
    /// Изменение своего профиля.
    Profile {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Бан пользователя с удалением его постов (только админ).
    Ban {
        #[arg(long)]
        username: String,
    },
    /// Снятие бана (только админ).
    Unban {
        #[arg(long)]
        username: String,
    },
    /// Выдача прав администратора (только админ).
    Promote {
        #[arg(long)]
        username: String,
    },
    /// Счётчики ленты.
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    token: Option<String>,
    username: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let server = resolve_server(cli.server, std::env::var(SERVER_ENV).ok());
    let mut client = EchoClient::new(server).map_err(map_client_error)?;

    if let Some(session) = load_session().context("не удалось прочитать .echo_session")? {
        client.set_session(session.token, session.username);
    }

    match cli.command {
        Command::Health => {
            client.health().await.map_err(map_client_error)?;
            println!("Сервер доступен");
        }
        Command::Register { username, password } => {
            let user = client
                .register(&username, &password)
                .await
                .map_err(map_client_error)?;
            print_user("Регистрация успешна", &user);
            println!("Теперь выполните `echo-cli login ...`");
        }
        Command::Login { username, password } => {
            let auth = client
                .login(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_session(&client).context("не удалось сохранить сессию")?;
            print_auth("Вход выполнен", &auth);
        }
        Command::Logout => {
            client.logout().await.map_err(map_client_error)?;
            clear_session().context("не удалось удалить .echo_session")?;
            println!("Выход выполнен");
        }
        Command::ActAs { username } => {
            client.act_as(username.trim());
            persist_session(&client).context("не удалось сохранить сессию")?;
            println!("Действия выполняются от имени {}", username.trim());
        }
        Command::List {
            sort,
            limit,
            offset,
        } => {
            let list = client
                .list_posts(sort, limit, offset)
                .await
                .map_err(map_client_error)?;
            print_list(&list);
        }
        Command::Search {
            query,
            limit,
            offset,
        } => {
            let list = client
                .search_posts(&query, limit, offset)
                .await
                .map_err(map_client_error)?;
            print_list(&list);
        }
        Command::Get { id } => {
            let post = client.get_post(id).await.map_err(map_client_error)?;
            print_post("Пост", &post);
        }
        Command::Create {
            title,
            description,
            tags,
        } => {
            let post = client
                .create_post(&title, &description, &tags)
                .await
                .map_err(map_client_error)?;
            print_post("Пост создан", &post);
        }
        Command::Delete { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id}");
        }
        Command::Like { id } => {
            let post = client.like(id).await.map_err(map_client_error)?;
            print_post("Реакция обновлена", &post);
        }
        Command::Dislike { id } => {
            let post = client.dislike(id).await.map_err(map_client_error)?;
            print_post("Реакция обновлена", &post);
        }
        Command::Comment { id, text } => {
            let comment = client
                .add_comment(id, &text)
                .await
                .map_err(map_client_error)?;
            print_comment("Комментарий добавлен", &comment);
        }
        Command::Bookmark { id } => {
            let outcome = client.toggle_bookmark(id).await.map_err(map_client_error)?;
            if outcome.bookmarked {
                println!("Пост добавлен в закладки: id={id}");
            } else {
                println!("Пост убран из закладок: id={id}");
            }
        }
        Command::Bookmarks { username } => {
            let owner = username
                .or_else(|| client.username().map(str::to_string))
                .ok_or_else(|| map_client_error(EchoClientError::MissingActor))?;
            let posts = client.bookmarks(&owner).await.map_err(map_client_error)?;
            println!("Закладок у {owner}: {}", posts.len());
            for post in &posts {
                print_post_line(post);
            }
        }
        Command::Trending { limit } => {
            let tags = client.trending_tags(limit).await.map_err(map_client_error)?;
            print_trending(&tags);
        }
        Command::Users => {
            let users = client.list_users().await.map_err(map_client_error)?;
            println!("Пользователей: {}", users.len());
            for user in &users {
                println!("- {}", describe_user(user));
            }
        }
        Command::Online => {
            let online = client.online_users().await.map_err(map_client_error)?;
            println!("Онлайн: {}", online.len());
            for username in &online {
                println!("- {username}");
            }
        }
        Command::User { username } => {
            let user = client.get_user(&username).await.map_err(map_client_error)?;
            print_user("Пользователь", &user);
        }
        Command::Profile { bio, avatar } => {
            let user = client
                .update_profile(bio.as_deref(), avatar.as_deref())
                .await
                .map_err(map_client_error)?;
            print_user("Профиль обновлён", &user);
        }
        Command::Ban { username } => {
            let outcome = client.ban(&username).await.map_err(map_client_error)?;
            print_moderation("Пользователь заблокирован", &outcome);
        }
        Command::Unban { username } => {
            let outcome = client.unban(&username).await.map_err(map_client_error)?;
            print_moderation("Блокировка снята", &outcome);
        }
        Command::Promote { username } => {
            let outcome = client.promote(&username).await.map_err(map_client_error)?;
            print_moderation("Права администратора выданы", &outcome);
        }
        Command::Stats => {
            let stats = client.stats().await.map_err(map_client_error)?;
            print_stats(&stats);
        }
    }

    Ok(())
}

fn resolve_server(flag: Option<String>, env: Option<String>) -> String {
    let raw = flag
        .or(env)
        .filter(|server| !server.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HTTP_SERVER.to_string());
    normalize_server(raw.trim().to_string())
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_session(raw: &str) -> Option<StoredSession> {
    let session: StoredSession = serde_json::from_str(raw).ok()?;
    if session.username.trim().is_empty() {
        return None;
    }
    let token = session.token.filter(|token| !token.trim().is_empty());
    Some(StoredSession {
        token,
        username: session.username,
    })
}

fn load_session() -> io::Result<Option<StoredSession>> {
    if !Path::new(SESSION_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(SESSION_FILE)?;
    Ok(parse_session(&raw))
}

fn persist_session(client: &EchoClient) -> io::Result<()> {
    let Some(username) = client.username() else {
        return Ok(());
    };
    let session = StoredSession {
        token: client.token().map(str::to_string),
        username: username.to_string(),
    };
    let raw = serde_json::to_string_pretty(&session).map_err(io::Error::other)?;
    fs::write(SESSION_FILE, raw)
}

fn clear_session() -> io::Result<()> {
    match fs::remove_file(SESSION_FILE) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn map_client_error(err: EchoClientError) -> anyhow::Error {
    let message = match err {
        EchoClientError::MissingActor => {
            "нужна сессия: выполните `echo-cli login ...` или `echo-cli act-as ...`".to_string()
        }
        EchoClientError::Unauthorized(message) => format!("требуется авторизация: {message}"),
        EchoClientError::Forbidden(message) => format!("действие запрещено: {message}"),
        EchoClientError::NotFound(message) => format!("не найдено: {message}"),
        EchoClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        EchoClientError::Server { status, message } => {
            format!("ошибка сервера {status}: {message}")
        }
        EchoClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow::anyhow!(message)
}

fn describe_user(user: &User) -> String {
    let mut flags = Vec::new();
    if user.is_admin {
        flags.push("admin");
    }
    if user.banned {
        flags.push("banned");
    }
    if flags.is_empty() {
        user.username.clone()
    } else {
        format!("{} [{}]", user.username, flags.join(", "))
    }
}

fn print_auth(title: &str, auth: &AuthResponse) {
    println!("{title}");
    println!("token: {}", auth.access_token);
    print_user("user:", &auth.user);
}

fn print_user(title: &str, user: &User) {
    println!("{title}");
    println!("  username: {}", describe_user(user));
    println!("  created_at: {}", user.created_at);
    if let Some(last_seen) = user.last_seen {
        println!("  last_seen: {last_seen}");
    }
    if !user.bio.is_empty() {
        println!("  bio: {}", user.bio);
    }
    println!("  avatar: {}", user.avatar);
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("author: {}", post.username);
    println!("title: {}", post.title);
    println!("description: {}", post.description);
    println!("timestamp: {}", post.timestamp);
    println!(
        "likes: {}, dislikes: {}, score: {}",
        post.likes.len(),
        post.dislikes.len(),
        post.score
    );
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(" "));
    }
    for comment in &post.comments {
        println!("  > {}: {}", comment.username, comment.text);
    }
}

fn print_comment(title: &str, comment: &Comment) {
    println!("{title}");
    println!("id: {}", comment.id);
    println!("{} ({}): {}", comment.username, comment.timestamp, comment.text);
}

fn print_list(list: &ListPostsResponse) {
    println!(
        "Постов: {} (sort={}, limit={}, offset={}, total={})",
        list.posts.len(),
        list.sort,
        list.limit,
        list.offset,
        list.total
    );

    for post in &list.posts {
        print_post_line(post);
    }
}

fn print_post_line(post: &Post) {
    println!(
        "- [{}] {} (author={}, score={})",
        post.id, post.title, post.username, post.score
    );
}

fn print_trending(tags: &[TagCount]) {
    if tags.is_empty() {
        println!("Тегов пока нет");
        return;
    }
    for (place, entry) in tags.iter().enumerate() {
        println!("{}. {} ({})", place + 1, entry.tag, entry.count);
    }
}

fn print_moderation(title: &str, outcome: &ModerationResponse) {
    println!("{title}: {}", describe_user(&outcome.user));
    if outcome.removed_posts > 0 {
        println!("Удалено постов: {}", outcome.removed_posts);
    }
}

fn print_stats(stats: &Stats) {
    println!("Пользователей: {}", stats.total_users);
    println!("Постов: {}", stats.total_posts);
    println!("Онлайн: {}", stats.online_users);
    println!("Реакций и комментариев: {}", stats.total_interactions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:9000".to_string());
        assert_eq!(s, "http://127.0.0.1:9000");
    }

    #[test]
    fn resolve_server_prefers_flag_over_env() {
        let s = resolve_server(
            Some("localhost:9999".to_string()),
            Some("http://env:1".to_string()),
        );
        assert_eq!(s, "http://localhost:9999");

        let s = resolve_server(None, Some("http://env:1".to_string()));
        assert_eq!(s, "http://env:1");
    }

    #[test]
    fn resolve_server_falls_back_to_default() {
        assert_eq!(resolve_server(None, None), DEFAULT_HTTP_SERVER);
        assert_eq!(
            resolve_server(None, Some("  ".to_string())),
            DEFAULT_HTTP_SERVER
        );
    }

    #[test]
    fn parse_session_reads_token_and_username() {
        let session = parse_session(r#"{"token": "abc.def.ghi", "username": "alice"}"#)
            .expect("session must parse");
        assert_eq!(session.token.as_deref(), Some("abc.def.ghi"));
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn parse_session_allows_missing_token() {
        let session = parse_session(r#"{"username": "bob"}"#).expect("session must parse");
        assert!(session.token.is_none());

        let session =
            parse_session(r#"{"token": " ", "username": "bob"}"#).expect("session must parse");
        assert!(session.token.is_none());
    }

    #[test]
    fn parse_session_rejects_garbage() {
        assert!(parse_session("not json").is_none());
        assert!(parse_session(r#"{"username": "  "}"#).is_none());
    }

    #[test]
    fn cli_parses_sort_and_uuid() {
        let cli = Cli::try_parse_from(["echo-cli", "list", "--sort", "popular", "--limit", "5"])
            .expect("args must parse");
        match cli.command {
            Command::List { sort, limit, .. } => {
                assert_eq!(sort, FeedSort::Popular);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let bad = Cli::try_parse_from(["echo-cli", "get", "--id", "42"]);
        assert!(bad.is_err());
    }

    #[test]
    fn cli_collects_repeated_tags() {
        let cli = Cli::try_parse_from([
            "echo-cli",
            "create",
            "--title",
            "Hello",
            "--description",
            "This is long enough",
            "--tag",
            "rust",
            "--tag",
            "#async",
        ])
        .expect("args must parse");
        match cli.command {
            Command::Create { tags, .. } => assert_eq!(tags, ["rust", "#async"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_trending_and_bookmarks_defaults() {
        let cli = Cli::try_parse_from(["echo-cli", "trending"]).expect("args must parse");
        assert!(matches!(cli.command, Command::Trending { limit: 8 }));

        let cli = Cli::try_parse_from(["echo-cli", "bookmarks"]).expect("args must parse");
        assert!(matches!(cli.command, Command::Bookmarks { username: None }));
    }
}
