//! Aggregation pipeline builders.
//!
//! Each function returns the pipeline as data; the [`crate::Store`] methods
//! run them and decode the results into the read models in
//! [`crate::models`]. Keeping the builders pure lets their shape be tested
//! without a database.

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use vidtube_core::{PageQuery, escape_regex};

use crate::schema::collections;

/// `$lookup` of a single user by `local_field`, projected to `fields` and
/// unwrapped from the lookup array with `$first` into `as_field`.
fn lookup_user(local_field: &str, as_field: &str, fields: &[&str]) -> [Document; 2] {
    let mut projection = Document::new();
    for field in fields {
        projection.insert(*field, 1);
    }
    [
        doc! {
            "$lookup": {
                "from": collections::USERS,
                "localField": local_field,
                "foreignField": "_id",
                "as": as_field,
                "pipeline": [ { "$project": projection } ],
            }
        },
        doc! { "$addFields": { as_field: { "$first": format!("${}", as_field) } } },
    ]
}

/// Public profile of a channel as seen by `viewer`.
///
/// Adds `subscribersCount`, `channelsSubscribedToCount` and `isSubscribed`
/// (whether `viewer` appears among the channel's subscribers).
pub fn channel_profile(username: &str, viewer: Option<ObjectId>) -> Vec<Document> {
    let viewer = viewer.map(Bson::ObjectId).unwrap_or(Bson::Null);
    vec![
        doc! { "$match": { "username": username.trim().to_lowercase() } },
        doc! {
            "$lookup": {
                "from": collections::SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "channel",
                "as": "subscribers",
            }
        },
        doc! {
            "$lookup": {
                "from": collections::SUBSCRIPTIONS,
                "localField": "_id",
                "foreignField": "subscriber",
                "as": "subscribedTo",
            }
        },
        doc! {
            "$addFields": {
                "subscribersCount": { "$size": "$subscribers" },
                "channelsSubscribedToCount": { "$size": "$subscribedTo" },
                "isSubscribed": {
                    "$cond": {
                        "if": { "$in": [viewer, "$subscribers.subscriber"] },
                        "then": true,
                        "else": false,
                    }
                },
            }
        },
        doc! {
            "$project": {
                "fullname": 1,
                "username": 1,
                "email": 1,
                "avatar": 1,
                "coverImage": 1,
                "subscribersCount": 1,
                "channelsSubscribedToCount": 1,
                "isSubscribed": 1,
            }
        },
    ]
}

/// A user's watch history joined with each video and the video's owner.
///
/// The joined videos land in `videos`; `watchHistory` keeps the id order so
/// the caller can restore it.
pub fn watch_history(user_id: ObjectId) -> Vec<Document> {
    let [owner_lookup, owner_first] =
        lookup_user("owner", "owner", &["fullname", "username", "avatar"]);
    vec![
        doc! { "$match": { "_id": user_id } },
        doc! {
            "$lookup": {
                "from": collections::VIDEOS,
                "localField": "watchHistory",
                "foreignField": "_id",
                "as": "videos",
                "pipeline": [owner_lookup, owner_first],
            }
        },
        doc! { "$project": { "watchHistory": 1, "videos": 1 } },
    ]
}

/// The most viewed published video whose title contains `title`
/// (case-insensitive, matched literally), joined with its owner.
pub fn video_by_title(title: &str) -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "title": { "$regex": escape_regex(title.trim()), "$options": "i" },
                "isPublished": true,
            }
        },
        doc! { "$sort": { "views": -1, "createdAt": -1 } },
        doc! { "$limit": 1 },
        doc! {
            "$lookup": {
                "from": collections::USERS,
                "localField": "owner",
                "foreignField": "_id",
                "as": "owner",
            }
        },
        doc! { "$unwind": "$owner" },
        doc! {
            "$project": {
                "_id": 1,
                "title": 1,
                "description": 1,
                "thumbnail": 1,
                "videoFile": 1,
                "views": 1,
                "duration": 1,
                "isPublished": 1,
                "createdAt": 1,
                "owner._id": 1,
                "owner.username": 1,
                "owner.email": 1,
                "owner.fullname": 1,
            }
        },
    ]
}

/// Stages shared by the comment pipelines: video title and author lookups.
fn comment_joins() -> Vec<Document> {
    let [owner_lookup, owner_first] = lookup_user("owner", "owner", &["username", "avatar"]);
    vec![
        doc! {
            "$lookup": {
                "from": collections::VIDEOS,
                "localField": "video",
                "foreignField": "_id",
                "as": "video",
                "pipeline": [ { "$project": { "title": 1 } } ],
            }
        },
        doc! { "$addFields": { "video": { "$first": "$video" } } },
        owner_lookup,
        owner_first,
    ]
}

/// One page of a video's comments, newest first.
pub fn video_comments(video_id: ObjectId, page: PageQuery) -> Vec<Document> {
    let page = page.normalized();
    let skip = page.skip() as i64;
    let limit = i64::from(page.limit);
    let mut pipeline = vec![
        doc! { "$match": { "video": video_id } },
        doc! { "$sort": { "createdAt": -1, "_id": -1 } },
        doc! { "$skip": skip },
        doc! { "$limit": limit },
    ];
    pipeline.extend(comment_joins());
    pipeline
}

/// A single comment with its video title and author username.
pub fn comment_details(comment_id: ObjectId) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": { "_id": comment_id } }];
    pipeline.extend(comment_joins());
    pipeline
}

/// Videos liked by `user_id`, most recent like first. Likes whose video no
/// longer exists are dropped.
pub fn liked_videos(user_id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "likedBy": user_id, "video": { "$ne": null } } },
        doc! { "$sort": { "createdAt": -1 } },
        doc! {
            "$lookup": {
                "from": collections::VIDEOS,
                "localField": "video",
                "foreignField": "_id",
                "as": "video",
                "pipeline": [
                    { "$project": {
                        "title": 1, "description": 1, "thumbnail": 1,
                        "duration": 1, "views": 1, "owner": 1,
                    } },
                ],
            }
        },
        doc! { "$unwind": "$video" },
        doc! { "$project": { "video": 1, "createdAt": 1 } },
    ]
}

fn subscription_edges(match_field: &str, id: ObjectId, other_side: &str) -> Vec<Document> {
    let [user_lookup, user_first] =
        lookup_user(other_side, "user", &["username", "email", "fullname", "avatar"]);
    vec![
        doc! { "$match": { match_field: id } },
        doc! { "$sort": { "createdAt": -1 } },
        user_lookup,
        user_first,
        doc! { "$match": { "user": { "$ne": null } } },
        doc! { "$project": { "user": 1, "createdAt": 1 } },
    ]
}

/// Users subscribed to `channel`.
pub fn channel_subscribers(channel: ObjectId) -> Vec<Document> {
    subscription_edges("channel", channel, "subscriber")
}

/// Channels `subscriber` is subscribed to.
pub fn subscribed_channels(subscriber: ObjectId) -> Vec<Document> {
    subscription_edges("subscriber", subscriber, "channel")
}

/// A playlist with its videos, kept in playlist order, and its owner.
pub fn playlist_details(playlist_id: ObjectId) -> Vec<Document> {
    let [owner_lookup, owner_first] =
        lookup_user("owner", "owner", &["username", "fullname", "email"]);
    vec![
        doc! { "$match": { "_id": playlist_id } },
        doc! {
            "$lookup": {
                "from": collections::VIDEOS,
                "localField": "videos",
                "foreignField": "_id",
                "as": "joinedVideos",
                "pipeline": [
                    { "$project": {
                        "title": 1, "description": 1, "thumbnail": 1,
                        "duration": 1, "views": 1, "owner": 1,
                    } },
                ],
            }
        },
        // $lookup does not preserve the order of the local array.
        doc! {
            "$addFields": {
                "videos": {
                    "$filter": {
                        "input": {
                            "$map": {
                                "input": "$videos",
                                "as": "videoId",
                                "in": {
                                    "$first": {
                                        "$filter": {
                                            "input": "$joinedVideos",
                                            "as": "joined",
                                            "cond": { "$eq": ["$$joined._id", "$$videoId"] },
                                        }
                                    }
                                },
                            }
                        },
                        "as": "video",
                        "cond": { "$ne": ["$$video", null] },
                    }
                }
            }
        },
        doc! { "$project": { "joinedVideos": 0 } },
        owner_lookup,
        owner_first,
    ]
}

/// Tweets by `owner`, newest first, with author and like count.
pub fn user_tweets(owner: ObjectId) -> Vec<Document> {
    let [owner_lookup, owner_first] =
        lookup_user("owner", "owner", &["username", "fullname", "avatar"]);
    vec![
        doc! { "$match": { "owner": owner } },
        doc! { "$sort": { "createdAt": -1 } },
        owner_lookup,
        owner_first,
        doc! {
            "$lookup": {
                "from": collections::LIKES,
                "localField": "_id",
                "foreignField": "tweet",
                "as": "likes",
            }
        },
        doc! { "$addFields": { "likesCount": { "$size": "$likes" } } },
        doc! { "$project": { "likes": 0 } },
    ]
}

/// Video count, summed views and likes received across a channel's videos.
///
/// Produces at most one document; no document means the channel has no
/// videos.
pub fn channel_video_stats(channel: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "owner": channel } },
        doc! {
            "$lookup": {
                "from": collections::LIKES,
                "localField": "_id",
                "foreignField": "video",
                "as": "likes",
            }
        },
        doc! {
            "$group": {
                "_id": Bson::Null,
                "totalVideos": { "$sum": 1 },
                "totalViews": { "$sum": "$views" },
                "totalLikes": { "$sum": { "$size": "$likes" } },
            }
        },
        doc! { "$project": { "_id": 0 } },
    ]
}
