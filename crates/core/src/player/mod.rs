pub mod slow_movie_player;
