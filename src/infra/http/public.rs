use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Form, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::{
        auth::{AuthError, AuthService, SignupInput, StartedSession},
        blog::{BlogError, BlogService, PostInput},
        category::{CategoryError, CategoryService},
        error::{ErrorReport, HttpError},
        featured::{FeaturedError, FeaturedService},
    },
    domain::{posts, types::Category},
    infra::db::PostgresRepositories,
    presentation::views::{
        AboutTemplate, BlogIndexContext, BlogIndexTemplate, BlogShowContext, BlogShowTemplate,
        CategoryContext, CategoryTemplate, CommentView, ContactContext, ContactTemplate,
        FeaturedCard, FeaturedPageContext, FeaturedTemplate, HomeContext, IndexTemplate,
        LayoutChrome, LayoutContext, LoginContext, LoginTemplate, PostCard, PostDetailView,
        PostFormContext, PostFormTemplate, SignupContext, SignupTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::{
    RouterState, db_health_response,
    middleware::{
        CurrentUser, SESSION_COOKIE, log_responses, resolve_current_user, set_request_context,
    },
    repo_error_to_http,
};
use askama::Template;

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub featured: Arc<FeaturedService>,
    pub categories: Arc<CategoryService>,
    pub auth: Arc<AuthService>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: RouterState) -> Router<RouterState> {
    let session_state = state.http.clone();

    // Pages carry chrome, so they need the session cookie resolved first
    let page_routes = Router::new()
        .route("/", get(index))
        .route("/blog", get(blog_index))
        .route("/blog/new", get(new_post_form).post(create_post))
        .route("/blog/{id}", get(blog_show))
        .route("/blog/{id}/edit", get(edit_post_form).post(update_post))
        .route("/blog/{id}/delete", post(delete_post))
        .route("/blog/{id}/comments", post(add_comment))
        .route("/category/{name}", get(category_page))
        .route("/featured", get(featured_page))
        .route("/about", get(about_page))
        .route("/contact", get(contact_page).post(contact_submit))
        .route("/signup", get(signup_form).post(signup_submit))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", post(logout))
        .fallback(fallback_router)
        .layer(middleware::from_fn_with_state(
            session_state,
            resolve_current_user,
        ));

    // Health and bundled assets skip session resolution
    let bare_routes = Router::new()
        .route("/healthz", get(health))
        .route("/static/{*path}", get(crate::infra::assets::serve_static));

    page_routes
        .merge(bare_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    page: Option<u32>,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostForm {
    title: String,
    content: String,
    excerpt: String,
    category: String,
    tags: String,
    image_url: String,
}

impl PostForm {
    fn into_input(self) -> PostInput {
        PostInput {
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            category: self.category,
            tags: self.tags,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentForm {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactForm {
    name: String,
    email: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SignupForm {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginForm {
    email: String,
    password: String,
}

async fn index(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let home = state.blog.home().await;
    let content = HomeContext {
        featured: PostCard::from_records(&home.featured),
        recent: PostCard::from_records(&home.recent),
    };
    let chrome = LayoutChrome::build(user.as_ref(), "Home");
    render_template_response(
        IndexTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    )
}

async fn blog_index(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Response {
    let page = query.page.unwrap_or(1);
    let content = match query.category.as_deref() {
        // A category name this build does not know matches nothing.
        Some(name) => match name.parse::<Category>() {
            Ok(category) => list_content(&state, page, Some(category)).await,
            Err(()) => BlogIndexContext::build(Vec::new(), 1, 1, 0, None),
        },
        None => list_content(&state, page, None).await,
    };
    let chrome = LayoutChrome::build(user.as_ref(), "Blog");
    render_template_response(
        BlogIndexTemplate {
            view: LayoutContext::new(chrome, content),
        },
        StatusCode::OK,
    )
}

async fn list_content(state: &HttpState, page: u32, category: Option<Category>) -> BlogIndexContext {
    let listing = state.blog.list(page, category).await;
    BlogIndexContext::build(
        PostCard::from_records(&listing.posts),
        listing.page,
        listing.total_pages,
        listing.total,
        listing.category,
    )
}

async fn blog_show(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    let viewer = user.as_ref().map(|record| record.id);
    let Ok(id) = id.parse::<Uuid>() else {
        return render_not_found_response(LayoutChrome::build(user.as_ref(), "Not Found"));
    };

    match state.blog.detail(id, viewer).await {
        Ok(detail) => {
            let comments: Vec<CommentView> = detail
                .comments
                .iter()
                .map(CommentView::from_record)
                .collect();
            let chrome = LayoutChrome::build(user.as_ref(), &detail.post.title)
                .with_description(posts::display_excerpt(
                    detail.post.excerpt.as_deref(),
                    &detail.post.content,
                ));
            let content = BlogShowContext {
                post: PostDetailView::from_record(&detail.post, viewer),
                comment_count: comments.len(),
                comments,
                related: PostCard::from_records(&detail.related),
            };
            render_template_response(
                BlogShowTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::OK,
            )
        }
        Err(err) => blog_error_to_response(err, LayoutChrome::build(user.as_ref(), "Not Found")),
    }
}

async fn new_post_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let chrome = LayoutChrome::build(Some(&user), "New Post");
    render_template_response(
        PostFormTemplate {
            view: LayoutContext::new(chrome, PostFormContext::create()),
        },
        StatusCode::OK,
    )
}

async fn create_post(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PostForm>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let input = form.into_input();
    match state.blog.create(&user, input.clone()).await {
        Ok(created) => Redirect::to(&format!("/blog/{}", created.id)).into_response(),
        Err(BlogError::Domain(err)) => {
            let detail = err.to_string();
            let content = PostFormContext::create().with_input(&input, detail.clone());
            let chrome = LayoutChrome::build(Some(&user), "New Post");
            render_form_rejection(
                PostFormTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "infra::http::public::create_post",
                detail,
            )
        }
        Err(err) => blog_error_to_response(err, LayoutChrome::build(Some(&user), "New Post")),
    }
}

async fn edit_post_form(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let chrome = LayoutChrome::build(Some(&user), "Edit Post");
    let Ok(id) = id.parse::<Uuid>() else {
        return render_not_found_response(chrome);
    };
    match state.blog.editable(user.id, id).await {
        Ok(existing) => render_template_response(
            PostFormTemplate {
                view: LayoutContext::new(chrome, PostFormContext::edit(&existing)),
            },
            StatusCode::OK,
        ),
        Err(err) => blog_error_to_response(err, chrome),
    }
}

async fn update_post(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let Ok(id) = id.parse::<Uuid>() else {
        return render_not_found_response(LayoutChrome::build(Some(&user), "Edit Post"));
    };
    let input = form.into_input();
    match state.blog.update(user.id, id, input.clone()).await {
        Ok(updated) => Redirect::to(&format!("/blog/{}", updated.id)).into_response(),
        Err(BlogError::Domain(err)) => {
            let detail = err.to_string();
            let content = PostFormContext::edit_action(id).with_input(&input, detail.clone());
            let chrome = LayoutChrome::build(Some(&user), "Edit Post");
            render_form_rejection(
                PostFormTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "infra::http::public::update_post",
                detail,
            )
        }
        Err(err) => blog_error_to_response(err, LayoutChrome::build(Some(&user), "Edit Post")),
    }
}

async fn delete_post(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let Ok(id) = id.parse::<Uuid>() else {
        return render_not_found_response(LayoutChrome::build(Some(&user), "Blog"));
    };
    match state.blog.delete(user.id, id).await {
        Ok(()) => Redirect::to("/blog").into_response(),
        Err(err) => blog_error_to_response(err, LayoutChrome::build(Some(&user), "Blog")),
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    let Ok(id) = id.parse::<Uuid>() else {
        return render_not_found_response(LayoutChrome::build(Some(&user), "Blog"));
    };
    match state.blog.add_comment(&user, id, &form.content).await {
        // An empty comment silently lands back on the post page.
        Ok(_) | Err(BlogError::Domain(_)) => {
            Redirect::to(&format!("/blog/{id}")).into_response()
        }
        Err(err) => blog_error_to_response(err, LayoutChrome::build(Some(&user), "Blog")),
    }
}

async fn category_page(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(name): Path<String>,
) -> Response {
    match state.categories.page(&name).await {
        Ok(page) => {
            let chrome = LayoutChrome::build(user.as_ref(), page.category.as_str());
            let content = CategoryContext::build(
                page.category,
                PostCard::from_records(&page.posts),
                &page.stats,
            );
            render_template_response(
                CategoryTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::OK,
            )
        }
        Err(err) => {
            category_error_to_response(err, LayoutChrome::build(user.as_ref(), "Not Found"))
        }
    }
}

async fn featured_page(
    State(state): State<HttpState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    match state.featured.get_featured().await {
        Ok(entries) => {
            let chrome = LayoutChrome::build(user.as_ref(), "Featured");
            let content = FeaturedPageContext {
                entries: entries.iter().map(FeaturedCard::from_entry).collect(),
            };
            render_template_response(
                FeaturedTemplate {
                    view: LayoutContext::new(chrome, content),
                },
                StatusCode::OK,
            )
        }
        Err(FeaturedError::Repo(err)) => {
            repo_error_to_http("infra::http::public::featured_page", err).into_response()
        }
    }
}

async fn about_page(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    let chrome = LayoutChrome::build(user.as_ref(), "About")
        .with_description("What Voce is and who writes here.");
    render_template_response(
        AboutTemplate {
            view: LayoutContext::new(chrome, ()),
        },
        StatusCode::OK,
    )
}

async fn contact_page(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    let chrome = LayoutChrome::build(user.as_ref(), "Contact");
    render_template_response(
        ContactTemplate {
            view: LayoutContext::new(chrome, ContactContext { sent: false }),
        },
        StatusCode::OK,
    )
}

async fn contact_submit(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<ContactForm>,
) -> Response {
    info!(
        target = "voce::http::contact",
        name = %form.name,
        from = %form.email,
        chars = form.message.chars().count(),
        "Contact form submitted"
    );
    let chrome = LayoutChrome::build(user.as_ref(), "Contact");
    render_template_response(
        ContactTemplate {
            view: LayoutContext::new(chrome, ContactContext { sent: true }),
        },
        StatusCode::OK,
    )
}

async fn signup_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    let chrome = LayoutChrome::build(user.as_ref(), "Sign Up");
    render_template_response(
        SignupTemplate {
            view: LayoutContext::new(chrome, SignupContext::default()),
        },
        StatusCode::OK,
    )
}

async fn signup_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Response {
    let attempt = state
        .auth
        .signup(SignupInput {
            username: form.username.clone(),
            email: form.email.clone(),
            password: form.password,
            confirm_password: form.confirm_password,
        })
        .await;
    match attempt {
        Ok(session) => session_started_response(jar, &session),
        Err(AuthError::AlreadyRegistered) => render_form_rejection(
            SignupTemplate {
                view: LayoutContext::new(
                    LayoutChrome::build(None, "Sign Up"),
                    SignupContext {
                        error: Some("Email or username already exists".to_string()),
                        username: form.username,
                        email: form.email,
                    },
                ),
            },
            StatusCode::UNPROCESSABLE_ENTITY,
            "infra::http::public::signup_submit",
            "email or username already exists".to_string(),
        ),
        Err(AuthError::Domain(err)) => {
            let detail = err.to_string();
            render_form_rejection(
                SignupTemplate {
                    view: LayoutContext::new(
                        LayoutChrome::build(None, "Sign Up"),
                        SignupContext {
                            error: Some(detail.clone()),
                            username: form.username,
                            email: form.email,
                        },
                    ),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "infra::http::public::signup_submit",
                detail,
            )
        }
        Err(err) => auth_error_to_response(err),
    }
}

async fn login_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    let chrome = LayoutChrome::build(user.as_ref(), "Log In");
    render_template_response(
        LoginTemplate {
            view: LayoutContext::new(chrome, LoginContext::default()),
        },
        StatusCode::OK,
    )
}

async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.email, &form.password).await {
        Ok(session) => session_started_response(jar, &session),
        // Unknown address and wrong password get the same answer.
        Err(AuthError::InvalidCredentials) => render_form_rejection(
            LoginTemplate {
                view: LayoutContext::new(
                    LayoutChrome::build(None, "Log In"),
                    LoginContext {
                        error: Some("Invalid email or password".to_string()),
                        email: form.email,
                    },
                ),
            },
            StatusCode::UNAUTHORIZED,
            "infra::http::public::login_submit",
            "invalid email or password".to_string(),
        ),
        Err(err) => auth_error_to_response(err),
    }
}

async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Err(err) = state.auth.logout(cookie.value()).await
    {
        warn!(
            target = "voce::http::session",
            error = %err,
            "Could not remove session record on logout"
        );
    }
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/");
    (jar.remove(removal), Redirect::to("/")).into_response()
}

async fn health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn fallback_router(user: Option<Extension<CurrentUser>>) -> Response {
    let user = user.and_then(|Extension(CurrentUser(user))| user);
    render_not_found_response(LayoutChrome::build(user.as_ref(), "Not Found"))
}

fn session_started_response(jar: CookieJar, session: &StartedSession) -> Response {
    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_expires(session.expires_at);
    (jar.add(cookie), Redirect::to("/")).into_response()
}

fn render_form_rejection<T: Template>(
    template: T,
    status: StatusCode,
    source: &'static str,
    detail: String,
) -> Response {
    let mut response = render_template_response(template, status);
    ErrorReport::from_message(source, status, detail).attach(&mut response);
    response
}

fn blog_error_to_response(err: BlogError, chrome: LayoutChrome) -> Response {
    const SOURCE: &str = "infra::http::blog_error_to_response";
    match err {
        BlogError::NotFound => render_not_found_response(chrome),
        BlogError::NotAuthor => HttpError::new(
            SOURCE,
            StatusCode::FORBIDDEN,
            "Only the author may modify this post",
            "post belongs to a different account",
        )
        .into_response(),
        BlogError::Domain(err) => HttpError::from_error(
            SOURCE,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input",
            &err,
        )
        .into_response(),
        BlogError::Repo(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

fn category_error_to_response(err: CategoryError, chrome: LayoutChrome) -> Response {
    const SOURCE: &str = "infra::http::category_error_to_response";
    match err {
        CategoryError::InvalidCategory { name } => {
            let mut response = render_not_found_response(chrome);
            ErrorReport::from_message(
                SOURCE,
                StatusCode::NOT_FOUND,
                format!("unknown category `{name}`"),
            )
            .attach(&mut response);
            response
        }
        CategoryError::Repo(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

fn auth_error_to_response(err: AuthError) -> Response {
    const SOURCE: &str = "infra::http::auth_error_to_response";
    match err {
        AuthError::Repo(err) => repo_error_to_http(SOURCE, err).into_response(),
        err => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not complete the request",
            &err,
        )
        .into_response(),
    }
}
