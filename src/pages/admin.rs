use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use super::Liveness;
use crate::context::use_app;
use crate::http::{UserRecord, filter_users};
use crate::session::Notification;

fn full_name(user: &UserRecord) -> String {
	[user.first_name.as_deref(), user.last_name.as_deref()]
		.into_iter()
		.flatten()
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}

/// User list for administrators, with search and delete.
#[component]
pub fn AdminPage() -> impl IntoView {
	let app = use_app();
	let live = Liveness::new();
	let users = RwSignal::new(Vec::<UserRecord>::new());
	let loading = RwSignal::new(true);
	let query = RwSignal::new(String::new());

	{
		let (api, live) = (app.api(), live.clone());
		spawn_local(async move {
			let fetched = api.list_users_or_empty().await;
			if live.is_alive() {
				users.set(fetched);
				loading.set(false);
			}
		});
	}

	let delete = move |id: u64| {
		let (api, live) = (app.api(), live.clone());
		spawn_local(async move {
			// errors are already on the notification banner
			if api.delete_user(id).await.is_ok() && live.is_alive() {
				info!("deleted user {id}");
				users.update(|list| list.retain(|u| u.id != id));
				app.notify(Notification::success("User deleted."));
			}
		});
	};
	let delete = StoredValue::new_local(delete);

	let rows = move || {
		let needle = query.get();
		users.with(|all| {
			filter_users(all, &needle)
				.into_iter()
				.map(|user| {
					let id = user.id;
					view! {
						<tr>
							<td>{id}</td>
							<td>{user.username.clone()}</td>
							<td>{full_name(user)}</td>
							<td>{user.email.clone().unwrap_or_default()}</td>
							<td>
								<button
									class="danger"
									on:click=move |_| delete.with_value(|delete| delete(id))
								>
									"Delete"
								</button>
							</td>
						</tr>
					}
				})
				.collect_view()
		})
	};

	view! {
		<section class="page admin-page">
			<h1>"Users"</h1>
			<input type="search" placeholder="Search by username or name" bind:value=query />
			<Show when=move || !loading.get() fallback=|| view! { <p>"Loading users..."</p> }>
				<table class="user-table">
					<thead>
						<tr>
							<th>"ID"</th>
							<th>"Username"</th>
							<th>"Name"</th>
							<th>"E-mail"</th>
							<th></th>
						</tr>
					</thead>
					<tbody>{rows}</tbody>
				</table>
			</Show>
		</section>
	}
}
